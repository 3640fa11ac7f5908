use duewatch_core::db::{open_db, open_db_in_memory};
use duewatch_core::{
    HistoryRecord, HistoryStore, HistoryUpdate, PollerContext, RepoError,
    SqliteHistoryRepository, SqliteTaskRepository, Task,
};
use uuid::Uuid;

#[test]
fn unknown_task_reads_as_empty_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteHistoryRepository::new(&conn);

    assert!(store.get_history(Uuid::new_v4()).unwrap().is_empty());
}

#[test]
fn record_round_trips_through_json_column() {
    let conn = open_db_in_memory().unwrap();
    let task = seed_task(&conn);
    let store = SqliteHistoryRepository::new(&conn);

    let mut record = HistoryRecord::default();
    record.set_flag("end");
    record.set_flag(PollerContext::Foreground.flag_key("end").into_owned());
    record.set_last_notified(PollerContext::Background, 1_000);
    record.set_snooze_until(2_000);
    store.put_history(task.id, &record).unwrap();

    assert_eq!(store.get_history(task.id).unwrap(), record);

    let raw: String = conn
        .query_row(
            "SELECT history FROM reminder_history WHERE task_id = ?1;",
            [task.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["end"], true);
    assert_eq!(json["end_fg"], true);
    assert_eq!(json["last_notified"], 1_000);
    assert_eq!(json["snooze_until"], 2_000);
    assert!(json.get("last_notified_fg").is_none());
}

#[test]
fn writing_history_for_missing_task_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteHistoryRepository::new(&conn);
    let ghost = Uuid::new_v4();

    let err = store
        .put_history(ghost, &HistoryRecord::default())
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost));
}

#[test]
fn deleting_a_task_drops_its_history() {
    let conn = open_db_in_memory().unwrap();
    let task = seed_task(&conn);
    let store = SqliteHistoryRepository::new(&conn);

    let mut record = HistoryRecord::default();
    record.set_flag("30m_before");
    store.put_history(task.id, &record).unwrap();

    SqliteTaskRepository::new(&conn).delete_task(task.id).unwrap();

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM reminder_history;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn keep_update_creates_no_row() {
    let conn = open_db_in_memory().unwrap();
    let task = seed_task(&conn);
    let store = SqliteHistoryRepository::new(&conn);

    let value = store
        .update_history(task.id, |current| -> Result<_, RepoError> {
            assert!(current.is_empty());
            Ok(HistoryUpdate::keep(7))
        })
        .unwrap();
    assert_eq!(value, 7);

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM reminder_history;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn failed_update_rolls_back() {
    let conn = open_db_in_memory().unwrap();
    let task = seed_task(&conn);
    let store = SqliteHistoryRepository::new(&conn);

    let result = store.update_history(task.id, |_| -> Result<HistoryUpdate<()>, RepoError> {
        Err(RepoError::InvalidData("refused".to_string()))
    });
    assert!(result.is_err());

    // The connection is usable and no transaction is left open.
    assert!(conn.is_autocommit());
    assert!(store.get_history(task.id).unwrap().is_empty());
}

#[test]
fn updates_from_two_connections_both_land() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let background = open_db(&path).unwrap();
    let foreground = open_db(&path).unwrap();
    let task = seed_task(&background);

    let set_flag = |conn: &rusqlite::Connection, key: String| {
        SqliteHistoryRepository::new(conn)
            .update_history(task.id, move |current| -> Result<_, RepoError> {
                let mut next = current.clone();
                next.set_flag(key);
                Ok(HistoryUpdate::write(next, ()))
            })
            .unwrap();
    };

    set_flag(&background, "end".to_string());
    set_flag(
        &foreground,
        PollerContext::Foreground.flag_key("end").into_owned(),
    );

    let merged = SqliteHistoryRepository::new(&background)
        .get_history(task.id)
        .unwrap();
    assert!(merged.is_flagged("end"));
    assert!(merged.is_flagged("end_fg"));
}

fn seed_task(conn: &rusqlite::Connection) -> Task {
    let task = Task::new("Submit report").with_due_epoch_ms(1_772_357_400_000);
    SqliteTaskRepository::new(conn).create_task(&task).unwrap();
    task
}
