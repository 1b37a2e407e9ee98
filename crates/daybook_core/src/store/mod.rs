//! In-memory activity storage.
//!
//! # Responsibility
//! - Hold the date-to-activities mapping and its mutation rules.
//! - Stay free of I/O; persistence lives in `repo`.

pub mod activity_store;
