//! Command implementations for the txprobe CLI.

use log::info;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use std::path::Path;
use txprobe_core::db::{open_db, open_db_in_memory, DbResult};
use txprobe_core::{CounterError, TransactionalCounter};

type CommandResult = Result<(), Box<dyn Error>>;

/// Output settings shared by all commands.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn emit(self, text: String, value: serde_json::Value) -> CommandResult {
        if self.json {
            println!("{}", serde_json::to_string(&value)?);
        } else {
            println!("{text}");
        }
        Ok(())
    }
}

/// Counts observed while running the end-to-end scenario.
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    /// Rows present before the scenario started (0 for a fresh store).
    pub baseline: i64,
    pub after_initialize: i64,
    pub after_commit: i64,
    /// Message of the failure raised by the aborted insert.
    pub abort_error: String,
    pub after_abort: i64,
    pub passed: bool,
}

pub fn init(db: Option<&Path>, output: Output) -> CommandResult {
    let conn = open_store(db)?;
    let counter = TransactionalCounter::new(&conn);
    counter.initialize()?;
    let count = counter.count()?;
    output.emit(format!("initialized count={count}"), json!({ "count": count }))
}

pub fn count(db: Option<&Path>, output: Output) -> CommandResult {
    let conn = open_store(db)?;
    let count = TransactionalCounter::new(&conn).count()?;
    output.emit(format!("count={count}"), json!({ "count": count }))
}

pub fn commit(db: Option<&Path>, output: Output) -> CommandResult {
    let conn = open_store(db)?;
    let counter = TransactionalCounter::new(&conn);
    counter.commit_insert()?;
    let count = counter.count()?;
    output.emit(format!("committed count={count}"), json!({ "count": count }))
}

pub fn abort(db: Option<&Path>, output: Output) -> CommandResult {
    let conn = open_store(db)?;
    let counter = TransactionalCounter::new(&conn);
    let err = match counter.abort_insert() {
        Ok(never) => match never {},
        Err(err) => err,
    };
    if let CounterError::Aborted { observed_count } = err {
        let count = counter.count()?;
        output.emit(
            format!("aborted observed_count={observed_count} count={count}"),
            json!({ "aborted": true, "observed_count": observed_count, "count": count }),
        )?;
    }
    Err(err.into())
}

pub fn state(db: Option<&Path>, output: Output) -> CommandResult {
    let conn = open_store(db)?;
    let state = TransactionalCounter::new(&conn).state()?;
    let text = if state.is_present() {
        format!("present rows={}", state.rows())
    } else {
        "absent".to_string()
    };
    output.emit(text, serde_json::to_value(state)?)
}

pub fn scenario(db: Option<&Path>, output: Output) -> CommandResult {
    let conn = open_store(db)?;
    let report = run_scenario(&TransactionalCounter::new(&conn))?;
    info!(
        "event=scenario module=cli status={} baseline={} after_initialize={} after_commit={} after_abort={}",
        if report.passed { "ok" } else { "error" },
        report.baseline,
        report.after_initialize,
        report.after_commit,
        report.after_abort
    );

    output.emit(
        format!(
            "initialize count={}\ncommit count={}\nabort error=\"{}\" count={}\n{}",
            report.after_initialize,
            report.after_commit,
            report.abort_error,
            report.after_abort,
            if report.passed { "PASS" } else { "FAIL" }
        ),
        serde_json::to_value(&report)?,
    )?;

    if !report.passed {
        return Err("scenario observed unexpected row counts".into());
    }
    Ok(())
}

fn run_scenario(counter: &TransactionalCounter<'_>) -> Result<ScenarioReport, CounterError> {
    let baseline = counter.state()?.rows();

    counter.initialize()?;
    let after_initialize = counter.count()?;

    counter.commit_insert()?;
    let after_commit = counter.count()?;

    let abort_error = match counter.abort_insert() {
        Ok(never) => match never {},
        Err(err @ CounterError::Aborted { .. }) => err.to_string(),
        Err(err) => return Err(err),
    };
    let after_abort = counter.count()?;

    let passed = after_initialize == baseline + 1
        && after_commit == baseline + 2
        && after_abort == baseline + 2;

    Ok(ScenarioReport {
        baseline,
        after_initialize,
        after_commit,
        abort_error,
        after_abort,
        passed,
    })
}

fn open_store(db: Option<&Path>) -> DbResult<Connection> {
    match db {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
}

#[cfg(test)]
mod tests {
    use super::run_scenario;
    use txprobe_core::db::open_db_in_memory;
    use txprobe_core::TransactionalCounter;

    #[test]
    fn scenario_on_fresh_store_counts_one_two_two() {
        let conn = open_db_in_memory().unwrap();
        let report = run_scenario(&TransactionalCounter::new(&conn)).unwrap();

        assert_eq!(report.baseline, 0);
        assert_eq!(report.after_initialize, 1);
        assert_eq!(report.after_commit, 2);
        assert_eq!(report.abort_error, "count=3");
        assert_eq!(report.after_abort, 2);
        assert!(report.passed);
    }

    #[test]
    fn scenario_is_relative_to_existing_rows() {
        let conn = open_db_in_memory().unwrap();
        let counter = TransactionalCounter::new(&conn);
        counter.initialize().unwrap();

        let report = run_scenario(&counter).unwrap();

        assert_eq!(report.baseline, 1);
        assert_eq!(report.after_abort, 3);
        assert!(report.passed);
    }
}
