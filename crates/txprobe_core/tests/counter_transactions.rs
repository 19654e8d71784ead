use txprobe_core::db::{open_db_in_memory, with_write_scope};
use txprobe_core::{
    CounterError, CounterResult, Row, RowRepository, SqliteRowRepository, TableState,
    TransactionalCounter,
};

#[test]
fn initialize_creates_table_with_one_seed_row() {
    let conn = open_db_in_memory().unwrap();
    let counter = TransactionalCounter::new(&conn);

    counter.initialize().unwrap();

    assert_eq!(counter.count().unwrap(), 1);
    let seed_id: i64 = conn
        .query_row("SELECT id FROM foo;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(seed_id, 0);
}

#[test]
fn commit_insert_adds_one_row() {
    let conn = open_db_in_memory().unwrap();
    let counter = TransactionalCounter::new(&conn);
    counter.initialize().unwrap();

    counter.commit_insert().unwrap();

    assert_eq!(counter.count().unwrap(), 2);
    assert_eq!(counter.count().unwrap(), 2);
}

#[test]
fn abort_insert_fails_and_rolls_back() {
    let conn = open_db_in_memory().unwrap();
    let counter = TransactionalCounter::new(&conn);
    counter.initialize().unwrap();

    let err = counter.abort_insert().unwrap_err();

    assert!(matches!(err, CounterError::Aborted { observed_count: 2 }));
    assert_eq!(err.to_string(), "count=2");
    assert_eq!(counter.count().unwrap(), 1);
    assert!(conn.is_autocommit());
}

#[test]
fn abort_insert_observes_its_own_insert_every_time() {
    let conn = open_db_in_memory().unwrap();
    let counter = TransactionalCounter::new(&conn);
    counter.initialize().unwrap();
    counter.commit_insert().unwrap();

    for _ in 0..3 {
        let before = counter.count().unwrap();
        match counter.abort_insert() {
            Err(CounterError::Aborted { observed_count }) => {
                assert_eq!(observed_count, before + 1);
            }
            other => panic!("unexpected abort result: {other:?}"),
        }
        assert_eq!(counter.count().unwrap(), before);
    }
}

#[test]
fn full_scenario_counts_one_two_two() {
    let conn = open_db_in_memory().unwrap();
    let counter = TransactionalCounter::new(&conn);

    counter.initialize().unwrap();
    assert_eq!(counter.count().unwrap(), 1);

    counter.commit_insert().unwrap();
    assert_eq!(counter.count().unwrap(), 2);

    assert!(counter.abort_insert().is_err());
    assert_eq!(counter.count().unwrap(), 2);
}

#[test]
fn count_is_read_only_and_leaves_connection_writable() {
    let conn = open_db_in_memory().unwrap();
    let counter = TransactionalCounter::new(&conn);
    counter.initialize().unwrap();

    for _ in 0..5 {
        assert_eq!(counter.count().unwrap(), 1);
    }

    let query_only: i64 = conn
        .query_row("PRAGMA query_only;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(query_only, 0);
    counter.commit_insert().unwrap();
    assert_eq!(counter.count().unwrap(), 2);
}

#[test]
fn count_before_initialize_surfaces_store_error() {
    let conn = open_db_in_memory().unwrap();
    let counter = TransactionalCounter::new(&conn);

    let err = counter.count().unwrap_err();
    assert!(matches!(err, CounterError::Db(_)));
    assert!(err.to_string().contains("no such table"));
}

#[test]
fn initialize_twice_keeps_schema_but_duplicates_seed_row() {
    let conn = open_db_in_memory().unwrap();
    let counter = TransactionalCounter::new(&conn);

    counter.initialize().unwrap();
    counter.initialize().unwrap();

    assert_eq!(counter.count().unwrap(), 2);
}

#[test]
fn initialize_fails_cleanly_when_name_is_taken_by_view() {
    let conn = open_db_in_memory().unwrap();
    // CREATE TABLE IF NOT EXISTS skips over the view, then the seed insert fails.
    conn.execute_batch("CREATE VIEW foo AS SELECT 1 AS id;")
        .unwrap();
    let counter = TransactionalCounter::new(&conn);

    let err = counter.initialize().unwrap_err();

    assert!(matches!(err, CounterError::Db(_)));
    assert!(conn.is_autocommit());
    assert_eq!(counter.state().unwrap(), TableState::Absent);
}

#[test]
fn state_tracks_table_lifecycle() {
    let conn = open_db_in_memory().unwrap();
    let counter = TransactionalCounter::new(&conn);

    assert_eq!(counter.state().unwrap(), TableState::Absent);

    counter.initialize().unwrap();
    assert_eq!(counter.state().unwrap(), TableState::Present { rows: 1 });

    counter.commit_insert().unwrap();
    let _ = counter.abort_insert();
    assert_eq!(counter.state().unwrap(), TableState::Present { rows: 2 });
}

#[test]
fn table_state_serializes_with_tag() {
    let json = serde_json::to_value(TableState::Present { rows: 2 }).unwrap();
    assert_eq!(json, serde_json::json!({ "state": "present", "rows": 2 }));

    let json = serde_json::to_value(TableState::Absent).unwrap();
    assert_eq!(json, serde_json::json!({ "state": "absent" }));
}

#[test]
fn failed_initialize_body_rolls_back_created_table() {
    let conn = open_db_in_memory().unwrap();

    let result: CounterResult<()> = with_write_scope(&conn, |tx| {
        let repo = SqliteRowRepository::new(tx);
        repo.ensure_table()?;
        repo.insert_row(Row::SEED)?;
        assert!(repo.table_exists()?);
        Err(CounterError::Aborted {
            observed_count: repo.count_rows()?,
        })
    });

    assert!(matches!(result, Err(CounterError::Aborted { observed_count: 1 })));
    assert!(!SqliteRowRepository::new(&conn).table_exists().unwrap());
    assert_eq!(
        TransactionalCounter::new(&conn).state().unwrap(),
        TableState::Absent
    );
}

#[test]
fn count_keeps_caller_read_only_connection_read_only() {
    let conn = open_db_in_memory().unwrap();
    let counter = TransactionalCounter::new(&conn);
    counter.initialize().unwrap();
    conn.pragma_update(None, "query_only", true).unwrap();

    assert_eq!(counter.count().unwrap(), 1);
    assert_eq!(counter.state().unwrap(), TableState::Present { rows: 1 });

    let query_only: i64 = conn
        .query_row("PRAGMA query_only;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(query_only, 1);
    assert!(counter.commit_insert().is_err());
}
