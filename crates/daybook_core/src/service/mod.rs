//! Core use-case services.
//!
//! # Responsibility
//! - Pair the in-memory store with its repository (load/save contract).
//! - Provide a UI-boundary session that resolves display positions.
//!
//! # Invariants
//! - No global state: callers own the service/session they act on.

pub mod calendar_service;
pub mod session;
