use duewatch_core::db::open_db_in_memory;
use duewatch_core::notify::memory::MemorySurface;
use duewatch_core::{
    ActionEvent, ActionOutcome, ActionService, Dispatcher, HistoryStore, NotificationAction,
    PollerContext, ReminderConfig, ReminderService, SnoozeService, SqliteHistoryRepository,
    SqliteTaskRepository, Task, TaskSource, ViewMessage,
};
use rusqlite::Connection;
use std::sync::Arc;
use uuid::Uuid;

const MINUTE: i64 = 60 * 1000;
const DUE: i64 = 1_772_357_400_000;

fn actions(conn: &Connection) -> ActionService<SqliteTaskRepository<'_>, SqliteHistoryRepository<'_>> {
    ActionService::new(
        SqliteTaskRepository::new(conn),
        SqliteHistoryRepository::new(conn),
        ReminderConfig::new().snooze_duration_ms(),
    )
}

fn seed(conn: &Connection) -> Task {
    let task = Task::new("Pick up prescription").with_due_epoch_ms(DUE);
    SqliteTaskRepository::new(conn).create_task(&task).unwrap();
    task
}

#[test]
fn wire_ids_map_to_actions() {
    let id = Uuid::new_v4();
    assert_eq!(
        ActionEvent::from_wire(Some("complete-task"), id).action,
        NotificationAction::Complete
    );
    assert_eq!(
        ActionEvent::from_wire(Some("snooze-task"), id).action,
        NotificationAction::Snooze
    );
    assert_eq!(ActionEvent::from_wire(None, id).action, NotificationAction::Open);
    assert_eq!(ActionEvent::from_wire(Some(""), id).action, NotificationAction::Open);
}

#[test]
fn complete_marks_task_done_and_broadcasts() {
    let conn = open_db_in_memory().unwrap();
    let task = seed(&conn);
    let host = MemorySurface::new().with_live_views(2);

    let outcome = actions(&conn)
        .handle(
            ActionEvent::from_wire(Some("complete-task"), task.id),
            DUE,
            &host,
        )
        .unwrap();

    assert_eq!(outcome, ActionOutcome::Completed { views_notified: 2 });
    assert!(SqliteTaskRepository::new(&conn)
        .get_task(task.id)
        .unwrap()
        .unwrap()
        .completed);
    assert_eq!(
        host.broadcasts(),
        vec![ViewMessage::TaskCompleted { task_id: task.id }]
    );
}

#[test]
fn completed_task_drops_out_of_later_ticks() {
    let conn = open_db_in_memory().unwrap();
    let task = seed(&conn);
    let surface = Arc::new(MemorySurface::new());

    actions(&conn)
        .handle(
            ActionEvent::from_wire(Some("complete-task"), task.id),
            DUE,
            surface.as_ref(),
        )
        .unwrap();

    let report = ReminderService::new(
        SqliteTaskRepository::new(&conn),
        SqliteHistoryRepository::new(&conn),
    )
    .run_tick(
        PollerContext::Background,
        DUE + 20 * MINUTE,
        &Dispatcher::background(surface.clone()),
        Some(surface.as_ref()),
    )
    .unwrap();

    assert_eq!(report.evaluated, 0);
    assert!(surface.os_notifications().is_empty());
    assert_eq!(report.badge_count, Some(0));
}

#[test]
fn snooze_sets_deadline_and_keeps_flags() {
    let conn = open_db_in_memory().unwrap();
    let task = seed(&conn);
    let store = SqliteHistoryRepository::new(&conn);

    let mut record = store.get_history(task.id).unwrap();
    record.set_flag("end");
    record.set_last_notified(PollerContext::Background, DUE);
    store.put_history(task.id, &record).unwrap();

    let outcome = actions(&conn)
        .handle(
            ActionEvent::from_wire(Some("snooze-task"), task.id),
            DUE + MINUTE,
            &MemorySurface::new(),
        )
        .unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::Snoozed {
            until_ms: DUE + 11 * MINUTE
        }
    );

    let after = store.get_history(task.id).unwrap();
    assert!(after.is_flagged("end"));
    assert_eq!(after.last_notified(PollerContext::Background), Some(DUE));
    assert_eq!(after.snooze_until(), Some(DUE + 11 * MINUTE));
}

#[test]
fn snoozing_again_extends_from_now() {
    let conn = open_db_in_memory().unwrap();
    let task = seed(&conn);
    let snooze = SnoozeService::new(SqliteHistoryRepository::new(&conn));

    snooze.snooze(task.id, DUE, 10 * MINUTE).unwrap();
    let until = snooze.snooze(task.id, DUE + 3 * MINUTE, 10 * MINUTE).unwrap();
    assert_eq!(until, DUE + 13 * MINUTE);
}

#[test]
fn open_focuses_live_view_or_launches() {
    let conn = open_db_in_memory().unwrap();
    let task = seed(&conn);

    let live = MemorySurface::new().with_live_views(1);
    let outcome = actions(&conn)
        .handle(ActionEvent::from_wire(None, task.id), DUE, &live)
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Focused);
    assert_eq!(live.focused(), vec![task.id]);
    assert_eq!(
        live.broadcasts(),
        vec![ViewMessage::NavigateTask { task_id: task.id }]
    );

    let closed = MemorySurface::new();
    let outcome = actions(&conn)
        .handle(ActionEvent::from_wire(Some("view-task"), task.id), DUE, &closed)
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Launched);
    assert_eq!(closed.launched(), vec![task.id]);
}

#[test]
fn actions_on_deleted_tasks_are_noops() {
    let conn = open_db_in_memory().unwrap();
    let ghost = Uuid::new_v4();
    let host = MemorySurface::new().with_live_views(1);

    for wire in ["complete-task", "snooze-task"] {
        let outcome = actions(&conn)
            .handle(ActionEvent::from_wire(Some(wire), ghost), DUE, &host)
            .unwrap();
        assert_eq!(outcome, ActionOutcome::TaskMissing);
    }
    assert!(host.broadcasts().is_empty());
}
