//! Core logic for txprobe.
//! A transactional counter that proves commit and rollback semantics of the
//! underlying SQLite row store.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::row::{Row, TableState, TABLE_NAME};
pub use repo::row_repo::{RowRepository, SqliteRowRepository};
pub use service::counter_service::{CounterError, CounterResult, TransactionalCounter};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
