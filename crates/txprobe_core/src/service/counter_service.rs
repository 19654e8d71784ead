//! Transactional counter use-case service.
//!
//! # Responsibility
//! - Own table `foo` on a borrowed connection and drive its lifecycle.
//! - Wrap every use case in an explicit write or read-only scope.
//!
//! # Invariants
//! - `initialize` is schema-idempotent but appends a seed row on every call.
//! - `count` and `state` never mutate stored state.
//! - `abort_insert` always fails, and its insert is never durable.
//!
//! # See also
//! - `db::scope` for commit/rollback rules.
//! - DESIGN.md for the initialize idempotency decision.

use crate::db::{with_read_only_scope, with_write_scope, DbError};
use crate::model::row::{Row, TableState};
use crate::repo::row_repo::{RowRepository, SqliteRowRepository};
use log::{error, info};
use rusqlite::Connection;
use std::convert::Infallible;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type CounterResult<T> = Result<T, CounterError>;

/// Errors from counter operations.
#[derive(Debug)]
pub enum CounterError {
    /// Underlying store failure.
    Db(DbError),
    /// Deliberate failure raised by [`TransactionalCounter::abort_insert`],
    /// carrying the row count observed inside the aborted transaction.
    Aborted { observed_count: i64 },
}

impl Display for CounterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Aborted { observed_count } => write!(f, "count={observed_count}"),
        }
    }
}

impl Error for CounterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Aborted { .. } => None,
        }
    }
}

impl From<DbError> for CounterError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CounterError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Counter over table `foo`, bound to one connection.
///
/// The owner constructs it with a store handle and then calls
/// [`initialize`](Self::initialize) explicitly.
pub struct TransactionalCounter<'conn> {
    conn: &'conn Connection,
}

impl<'conn> TransactionalCounter<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates the table if needed and inserts the seed row, atomically.
    pub fn initialize(&self) -> CounterResult<()> {
        let started_at = Instant::now();
        let result: CounterResult<()> = with_write_scope(self.conn, |tx| {
            let repo = SqliteRowRepository::new(tx);
            repo.ensure_table()?;
            repo.insert_row(Row::SEED)?;
            Ok(())
        });
        log_outcome("initialize", started_at, &result);
        result
    }

    /// Returns the number of rows, read on the read-only path.
    pub fn count(&self) -> CounterResult<i64> {
        let started_at = Instant::now();
        let result: CounterResult<i64> = with_read_only_scope(self.conn, |conn| {
            Ok(SqliteRowRepository::new(conn).count_rows()?)
        });
        log_outcome("count", started_at, &result);
        result
    }

    /// Inserts one probe row and commits.
    pub fn commit_insert(&self) -> CounterResult<()> {
        let started_at = Instant::now();
        let result: CounterResult<()> = with_write_scope(self.conn, |tx| {
            SqliteRowRepository::new(tx).insert_row(Row::PROBE)?;
            Ok(())
        });
        log_outcome("commit_insert", started_at, &result);
        result
    }

    /// Inserts one probe row, reads the count inside the same transaction,
    /// then fails with [`CounterError::Aborted`].
    ///
    /// The failure leaves the write scope uncaught, so the insert is rolled
    /// back. Never returns `Ok`.
    pub fn abort_insert(&self) -> CounterResult<Infallible> {
        let started_at = Instant::now();
        let result: CounterResult<Infallible> = with_write_scope(self.conn, |tx| {
            let repo = SqliteRowRepository::new(tx);
            repo.insert_row(Row::PROBE)?;
            // Why: read on the open transaction, not via `count()`, so the
            // uncommitted insert is visible in the reported count.
            let observed_count = repo.count_rows()?;
            Err(CounterError::Aborted { observed_count })
        });
        log_outcome("abort_insert", started_at, &result);
        result
    }

    /// Reports whether the table exists and how many rows it holds.
    pub fn state(&self) -> CounterResult<TableState> {
        let started_at = Instant::now();
        let result: CounterResult<TableState> = with_read_only_scope(self.conn, |conn| {
            let repo = SqliteRowRepository::new(conn);
            if !repo.table_exists()? {
                return Ok(TableState::Absent);
            }
            Ok(TableState::Present {
                rows: repo.count_rows()?,
            })
        });
        log_outcome("state", started_at, &result);
        result
    }
}

fn log_outcome<T>(op: &'static str, started_at: Instant, result: &CounterResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event=counter_op module=counter status=ok op={op} duration_ms={duration_ms}"),
        Err(CounterError::Aborted { observed_count }) => info!(
            "event=counter_op module=counter status=aborted op={op} duration_ms={duration_ms} observed_count={observed_count}"
        ),
        Err(err) => error!(
            "event=counter_op module=counter status=error op={op} duration_ms={duration_ms} error={err}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::CounterError;

    #[test]
    fn aborted_error_message_carries_observed_count() {
        let err = CounterError::Aborted { observed_count: 2 };
        assert_eq!(err.to_string(), "count=2");
    }
}
