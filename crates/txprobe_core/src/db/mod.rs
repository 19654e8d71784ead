//! SQLite row-store bootstrap and transaction scopes.
//!
//! # Responsibility
//! - Open and configure SQLite connections used by the counter.
//! - Provide explicit write and read-only transaction scopes.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a bounded busy timeout.
//! - Schema is owned by the counter (`CREATE TABLE IF NOT EXISTS`), not by a
//!   migration step at open time.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod scope;

pub use open::{open_db, open_db_in_memory, BUSY_TIMEOUT};
pub use scope::{with_read_only_scope, with_write_scope};

pub type DbResult<T> = Result<T, DbError>;

/// Transport-level error raised by the underlying store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
