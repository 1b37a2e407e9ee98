//! Domain model for calendar activities.
//!
//! # Responsibility
//! - Define the record shape shared by store, persistence and UI layers.
//! - Own the text forms of date keys and clock times.
//!
//! # Invariants
//! - Every record held by a store carries a stable `ActivityId`.
//! - Text forms parse back to the exact value that produced them.

pub mod activity;
