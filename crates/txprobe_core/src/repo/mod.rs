//! Repository layer for the counter table.
//!
//! # Responsibility
//! - Define the data access contract used by the counter service.
//! - Isolate SQLite query details from transaction orchestration.

pub mod row_repo;
