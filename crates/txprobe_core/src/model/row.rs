//! Row entity and table lifecycle state.
//!
//! # Invariants
//! - Rows are append-only: never updated or deleted by core code.
//! - After a single initialization on an empty store, the table holds exactly
//!   one [`Row::SEED`].
//!
//! # See also
//! - `repo::row_repo` for the SQL that persists these rows.

use serde::Serialize;

/// Name of the table owned by the counter.
pub const TABLE_NAME: &str = "foo";

/// One persisted integer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub id: i64,
}

impl Row {
    /// Baseline row written by initialization.
    pub const SEED: Row = Row { id: 0 };
    /// Row written by commit/abort probes.
    pub const PROBE: Row = Row { id: 1 };
}

/// Observable state of the counter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TableState {
    /// Table has not been created yet.
    Absent,
    /// Table exists and holds `rows` rows.
    Present { rows: i64 },
}

impl TableState {
    pub fn is_present(self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Row count, treating an absent table as empty.
    pub fn rows(self) -> i64 {
        match self {
            Self::Absent => 0,
            Self::Present { rows } => rows,
        }
    }
}
