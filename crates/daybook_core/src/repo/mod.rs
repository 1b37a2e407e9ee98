//! Persistence boundary for the activity store.
//!
//! # Responsibility
//! - Define the whole-store read/write contract used by services.
//! - Keep file format and filesystem details out of the service layer.
//!
//! # Invariants
//! - Reads reject malformed data instead of masking it.
//! - Writes always replace the full persisted snapshot.

pub mod file_repo;
