// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder lifecycle and snooze flows sharing one lock table.

use chrono::Duration;
use daybook_core::{EntityKind, EntityStatus, Module, NotificationPayload, TrackedEntity};
use daybook_notify::{RouteOutcome, ScheduleOutcome};
use daybook_notify::router::Dispatch;
use daybook_test_utils::TestHarness;

fn alarm_task(h: &TestHarness) -> TrackedEntity {
    use daybook_core::Clock;
    let mut task = TrackedEntity::new(EntityKind::Task, "task-7", "Call the bank");
    task.due_at = Some(h.clock.now() + Duration::hours(2));
    task.reminder = Some(r#"[{"offsetMinutes": 15}, {"offsetMinutes": 60}]"#.into());
    task.use_alarm = true;
    task
}

#[tokio::test]
async fn alarm_reminders_survive_in_sqlite_until_completion() {
    let h = TestHarness::builder().with_sqlite_store().build().await.unwrap();
    let task = alarm_task(&h);

    let outcome = h.coordinator.schedule_reminders(&task, "created").await.unwrap();
    let ScheduleOutcome::Scheduled { ids } = outcome else {
        panic!("expected reminders to be scheduled, got {outcome:?}");
    };
    assert_eq!(ids.len(), 2);
    assert!(h.scheduler.pending_ids().is_empty(), "alarms are never listed");
    assert_eq!(h.alarms().entries().await.unwrap().len(), 2);

    let mut done = task.clone();
    done.status = EntityStatus::Completed;
    let cancelled = h.coordinator.on_completed(&done).await.unwrap();

    let mut expected = ids.clone();
    expected.sort_unstable();
    let mut got = cancelled.cancelled.clone();
    got.sort_unstable();
    assert_eq!(got, expected);
    assert!(h.scheduler.alarm_ids().is_empty());
    assert!(h.alarms().entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn completed_entity_gets_nothing_on_reschedule() {
    let h = TestHarness::builder().build().await.unwrap();
    let mut task = alarm_task(&h);
    task.use_alarm = false;

    h.coordinator.schedule_reminders(&task, "created").await.unwrap();
    assert_eq!(h.scheduler.pending_ids().len(), 2);

    task.status = EntityStatus::Completed;
    let outcome = h.coordinator.reschedule_reminders(&task, "edited").await.unwrap();
    assert_eq!(outcome.cancelled.cancelled.len(), 2);
    assert!(matches!(outcome.scheduled, ScheduleOutcome::Skipped(_)));
    assert!(h.scheduler.pending_ids().is_empty());
}

#[tokio::test]
async fn concurrent_snoozes_get_distinct_counts() {
    let h = TestHarness::builder()
        .with_entity(TrackedEntity::new(EntityKind::Habit, "habit-3", "Stretch"))
        .build()
        .await
        .unwrap();
    h.scheduler.set_yield_inside_calls(true);

    let payload = NotificationPayload::parse("habit|habit-3|reminder|0|minutes").unwrap();
    let (a, b) = tokio::join!(
        h.snooze.snooze(EntityKind::Habit, "habit-3", &payload, Some(11), None),
        h.snooze.snooze(EntityKind::Habit, "habit-3", &payload, Some(11), None),
    );

    let mut counts = vec![a.unwrap().count, b.unwrap().count];
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2]);

    let stored = h.habits.get("habit-3").unwrap();
    let history: Vec<u32> = stored.snooze_history.iter().map(|r| r.count).collect();
    assert_eq!(history, vec![1, 2]);
}

#[tokio::test]
async fn snooze_through_router_then_delete_cancels_snoozed_notification() {
    let h = TestHarness::builder()
        .with_entity(TrackedEntity::new(EntityKind::Task, "task-1", "Submit report"))
        .build()
        .await
        .unwrap();

    let outcome = h
        .router
        .on_notification_response(Some("task|task-1|reminder|15|minutes"), Some("snooze"), Some(99))
        .await;
    assert_eq!(outcome, RouteOutcome::Dispatched(Dispatch::Snooze));
    assert_eq!(h.scheduler.pending_ids(), vec![99]);

    h.tasks.remove("task-1");
    let cancelled = h.coordinator.on_deleted(&Module::Task, "task-1").await.unwrap();
    assert_eq!(cancelled.cancelled, vec![99]);
    assert!(h.scheduler.pending_ids().is_empty());
    assert_eq!(h.universal.purged().len(), 1);
}
