//! Explicit transaction scopes over a borrowed SQLite connection.
//!
//! # Responsibility
//! - Run a body inside a write transaction: commit on `Ok`, roll back on `Err`.
//! - Run a body on a read-only path that cannot mutate stored state.
//!
//! # Invariants
//! - The transaction is released on every exit path, including unwinding
//!   (`rusqlite::Transaction` rolls back on drop).
//! - A body error is returned unchanged; rollback failures are only logged.
//! - `query_only` is restored to the caller's value after a read-only scope.
//!
//! # See also
//! - `service::counter_service` for the use cases built on these scopes.

use log::{debug, error, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::fmt::Display;

/// Runs `body` inside an `IMMEDIATE` transaction.
///
/// The write lock is taken when the scope opens, so concurrent writers wait
/// (up to the connection busy timeout) instead of failing at commit time.
///
/// # Errors
/// - Returns the body error after rolling the transaction back.
/// - Returns the store error when `BEGIN` or `COMMIT` fails.
pub fn with_write_scope<T, E, F>(conn: &Connection, body: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error> + Display,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    debug!("event=tx_scope module=db status=start kind=write");

    match body(&tx) {
        Ok(value) => {
            if let Err(err) = tx.commit() {
                error!("event=tx_scope module=db status=error kind=write outcome=commit error={err}");
                return Err(err.into());
            }
            debug!("event=tx_scope module=db status=ok kind=write outcome=commit");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=tx_scope module=db status=error kind=write outcome=rollback error={rollback_err}"
                );
            }
            debug!("event=tx_scope module=db status=ok kind=write outcome=rollback cause={err}");
            Err(err)
        }
    }
}

/// Runs `body` on a read-only path.
///
/// The connection is switched to `query_only` and the body reads inside a
/// `DEFERRED` transaction, so it sees one snapshot and takes no write lock.
/// Any write attempted by `body` fails with the store's read-only error.
pub fn with_read_only_scope<T, E, F>(conn: &Connection, body: F) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    let _query_only = QueryOnlyGuard::enable(conn)?;
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    debug!("event=tx_scope module=db status=start kind=read_only");

    let result = body(&*tx);

    // Why: nothing was written, so ROLLBACK and COMMIT end the snapshot alike.
    match tx.rollback() {
        Ok(()) => {
            debug!("event=tx_scope module=db status=ok kind=read_only outcome=finish");
        }
        Err(err) if result.is_ok() => {
            error!("event=tx_scope module=db status=error kind=read_only outcome=finish error={err}");
            return Err(err.into());
        }
        Err(err) => {
            warn!("event=tx_scope module=db status=error kind=read_only outcome=finish error={err}");
        }
    }

    result
}

struct QueryOnlyGuard<'conn> {
    conn: &'conn Connection,
    previous: bool,
}

impl<'conn> QueryOnlyGuard<'conn> {
    fn enable(conn: &'conn Connection) -> rusqlite::Result<Self> {
        let previous =
            conn.pragma_query_value(None, "query_only", |row| row.get::<_, bool>(0))?;
        if !previous {
            conn.pragma_update(None, "query_only", true)?;
        }
        Ok(Self { conn, previous })
    }
}

impl Drop for QueryOnlyGuard<'_> {
    fn drop(&mut self) {
        if self.previous {
            return;
        }
        if let Err(err) = self.conn.pragma_update(None, "query_only", false) {
            error!("event=tx_scope module=db status=error kind=read_only error_code=query_only_reset_failed error={err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{with_read_only_scope, with_write_scope};
    use rusqlite::Connection;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn conn_with_table() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(v INTEGER);").unwrap();
        conn
    }

    fn rows(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t;", [], |row| row.get(0))
            .unwrap()
    }

    fn query_only(conn: &Connection) -> i64 {
        conn.query_row("PRAGMA query_only;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn write_scope_commits_on_ok() {
        let conn = conn_with_table();

        let value = with_write_scope(&conn, |tx| {
            tx.execute("INSERT INTO t(v) VALUES (7);", [])?;
            Ok::<_, rusqlite::Error>(42)
        })
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(rows(&conn), 1);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn write_scope_rolls_back_on_err() {
        let conn = conn_with_table();

        let err = with_write_scope(&conn, |tx| {
            tx.execute("INSERT INTO t(v) VALUES (7);", [])?;
            Err::<(), _>(rusqlite::Error::QueryReturnedNoRows)
        })
        .unwrap_err();

        assert!(matches!(err, rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(rows(&conn), 0);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn write_scope_rolls_back_when_body_panics() {
        let conn = conn_with_table();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _ = with_write_scope(&conn, |tx| -> Result<(), rusqlite::Error> {
                tx.execute("INSERT INTO t(v) VALUES (7);", [])?;
                panic!("boom");
            });
        }));

        assert!(outcome.is_err());
        assert_eq!(rows(&conn), 0);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn read_only_scope_rejects_writes_and_restores_mode() {
        let conn = conn_with_table();

        let err = with_read_only_scope(&conn, |c| c.execute("INSERT INTO t(v) VALUES (1);", []))
            .unwrap_err();

        assert!(matches!(err, rusqlite::Error::SqliteFailure(_, _)));
        assert_eq!(rows(&conn), 0);
        assert_eq!(query_only(&conn), 0);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn read_only_scope_returns_body_value() {
        let conn = conn_with_table();
        conn.execute("INSERT INTO t(v) VALUES (3);", []).unwrap();

        let count: i64 = with_read_only_scope(&conn, |c| {
            c.query_row("SELECT COUNT(*) FROM t;", [], |row| row.get(0))
        })
        .unwrap();

        assert_eq!(count, 1);
        assert_eq!(query_only(&conn), 0);
    }

    #[test]
    fn read_only_scope_keeps_caller_query_only_mode() {
        let conn = conn_with_table();
        conn.pragma_update(None, "query_only", true).unwrap();

        let count: i64 = with_read_only_scope(&conn, |c| {
            c.query_row("SELECT COUNT(*) FROM t;", [], |row| row.get(0))
        })
        .unwrap();

        assert_eq!(count, 0);
        assert_eq!(query_only(&conn), 1);
        assert!(conn.execute("INSERT INTO t(v) VALUES (1);", []).is_err());
    }
}
