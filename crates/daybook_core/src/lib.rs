//! Core domain logic for Daybook, a personal activity calendar.
//! This crate is the single source of truth for store invariants.

pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::activity::{Activity, ActivityId, ActivityParseError, ClockTime, DateKey};
pub use repo::file_repo::{
    decode_store, encode_store, ActivityRepository, JsonFileRepository, RepoError, RepoResult,
    DEFAULT_STORE_FILE,
};
pub use service::calendar_service::{CalendarService, LoadOutcome};
pub use service::session::{ActivityDetails, CalendarSession, ListingRow};
pub use store::activity_store::ActivityStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
