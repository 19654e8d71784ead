//! Row repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Keep the SQL for table `foo` inside the persistence boundary.
//! - Operate on whatever connection the caller hands in, so transaction
//!   boundaries stay with the service.
//!
//! # Invariants
//! - Schema creation is `IF NOT EXISTS` and safe to repeat.
//! - Repository calls never open or close transactions themselves.

use crate::db::DbResult;
use crate::model::row::{Row, TABLE_NAME};
use rusqlite::{params, Connection};

/// Repository interface for the counter table.
pub trait RowRepository {
    /// Creates the table when it does not exist yet.
    fn ensure_table(&self) -> DbResult<()>;
    /// Appends one row.
    fn insert_row(&self, row: Row) -> DbResult<()>;
    /// Counts rows currently visible to the connection.
    fn count_rows(&self) -> DbResult<i64>;
    /// Returns whether the table exists.
    fn table_exists(&self) -> DbResult<bool>;
}

/// SQLite-backed row repository.
///
/// Accepts a plain connection or a `Transaction` (which derefs to one).
pub struct SqliteRowRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRowRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RowRepository for SqliteRowRepository<'_> {
    fn ensure_table(&self) -> DbResult<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE_NAME}(id INTEGER);"
        ))?;
        Ok(())
    }

    fn insert_row(&self, row: Row) -> DbResult<()> {
        self.conn.execute(
            &format!("INSERT INTO {TABLE_NAME}(id) VALUES (?1);"),
            params![row.id],
        )?;
        Ok(())
    }

    fn count_rows(&self) -> DbResult<i64> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {TABLE_NAME};"),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn table_exists(&self) -> DbResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [TABLE_NAME],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}
