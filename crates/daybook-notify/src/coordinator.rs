// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder lifecycle coordination for tasks and habits.
//!
//! Every public operation runs under the entity lock, so a schedule and a
//! cancel for the same entity never interleave. `reschedule_reminders` holds
//! the lock across both halves.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;
use daybook_core::{
    Clock, DaybookError, Delivery, EntityKind, EntityStatus, Module, ModuleAdapterHub,
    ModulePolicy, NotificationPayload, NotificationScheduler, ScheduleRequest, TrackedEntity,
    UniversalReminders,
};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::alarms::{AlarmEntry, AlarmLedger};
use crate::lock::EntityLockManager;
use crate::reminder::parse_reminder_spec;
use crate::trace;

/// Stable OS notification id for one reminder offset of an entity.
pub fn notification_id(module: &Module, entity_id: &str, offset_minutes: u32) -> i32 {
    derive_id(&format!("{module}|{entity_id}|{offset_minutes}"))
}

/// Id used for a snoozed notification when the original id is unknown.
pub fn snooze_notification_id(module: &Module, entity_id: &str) -> i32 {
    derive_id(&format!("{module}|{entity_id}|snooze"))
}

/// First 31 bits of the SHA-256 of `seed`, so ids are always non-negative.
fn derive_id(seed: &str) -> i32 {
    let digest = Sha256::digest(seed.as_bytes());
    let bits = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) & 0x7fff_ffff;
    bits as i32
}

/// Why `schedule_reminders` scheduled nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleSkip {
    PolicyDisabled,
    TerminalStatus(EntityKind, EntityStatus),
    NoReminders,
    NoDueTime,
}

impl ScheduleSkip {
    /// Reason code written to trace records.
    pub fn reason(&self) -> String {
        match self {
            ScheduleSkip::PolicyDisabled => "policy_disabled".to_string(),
            ScheduleSkip::TerminalStatus(kind, status) => format!("{kind}_status_{status}"),
            ScheduleSkip::NoReminders => "no_reminders".to_string(),
            ScheduleSkip::NoDueTime => "no_due_time".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Legacy reminders handed to the OS scheduler. Reminders whose fire time
    /// had already passed are not included.
    Scheduled { ids: Vec<i32> },
    /// The universal reminder subsystem owns this entity.
    Delegated { count: usize },
    Skipped(ScheduleSkip),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelOutcome {
    /// OS notification and alarm ids cancelled.
    pub cancelled: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleOutcome {
    pub cancelled: CancelOutcome,
    pub scheduled: ScheduleOutcome,
}

pub struct ReminderCoordinator {
    locks: Arc<EntityLockManager>,
    policy: Arc<dyn ModulePolicy>,
    universal: Arc<dyn UniversalReminders>,
    scheduler: Arc<dyn NotificationScheduler>,
    hub: Arc<dyn ModuleAdapterHub>,
    alarms: AlarmLedger,
    clock: Arc<dyn Clock>,
}

impl ReminderCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        locks: Arc<EntityLockManager>,
        policy: Arc<dyn ModulePolicy>,
        universal: Arc<dyn UniversalReminders>,
        scheduler: Arc<dyn NotificationScheduler>,
        hub: Arc<dyn ModuleAdapterHub>,
        alarms: AlarmLedger,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            locks,
            policy,
            universal,
            scheduler,
            hub,
            alarms,
            clock,
        }
    }

    pub async fn schedule_reminders(
        &self,
        entity: &TrackedEntity,
        source_flow: &str,
    ) -> Result<ScheduleOutcome, DaybookError> {
        let module = entity.module();
        self.locks
            .run_exclusive(module.as_str(), &entity.id, || {
                self.schedule_locked(entity, source_flow)
            })
            .await
    }

    pub async fn cancel_reminders(
        &self,
        module: &Module,
        entity_id: &str,
        reason: &str,
    ) -> Result<CancelOutcome, DaybookError> {
        self.locks
            .run_exclusive(module.as_str(), entity_id, || {
                self.cancel_locked(module, entity_id, reason)
            })
            .await
    }

    /// Cancel then schedule as one locked unit.
    pub async fn reschedule_reminders(
        &self,
        entity: &TrackedEntity,
        reason: &str,
    ) -> Result<RescheduleOutcome, DaybookError> {
        let module = entity.module();
        self.locks
            .run_exclusive(module.as_str(), &entity.id, || async {
                let cancelled = self.cancel_locked(&module, &entity.id, reason).await?;
                let scheduled = self.schedule_locked(entity, reason).await?;
                Ok::<_, DaybookError>(RescheduleOutcome {
                    cancelled,
                    scheduled,
                })
            })
            .await
    }

    pub async fn on_completed(&self, entity: &TrackedEntity) -> Result<CancelOutcome, DaybookError> {
        self.cancel_reminders(&entity.module(), &entity.id, "completed")
            .await
    }

    pub async fn on_postponed(
        &self,
        entity: &TrackedEntity,
    ) -> Result<RescheduleOutcome, DaybookError> {
        self.reschedule_reminders(entity, "postponed").await
    }

    /// Purge universal definitions, then cancel everything left for the entity.
    pub async fn on_deleted(
        &self,
        module: &Module,
        entity_id: &str,
    ) -> Result<CancelOutcome, DaybookError> {
        self.locks
            .run_exclusive(module.as_str(), entity_id, || async {
                self.universal.purge(module, entity_id).await?;
                self.cancel_locked(module, entity_id, "deleted").await
            })
            .await
    }

    async fn schedule_locked(
        &self,
        entity: &TrackedEntity,
        source_flow: &str,
    ) -> Result<ScheduleOutcome, DaybookError> {
        let module = entity.module();

        if !self.policy.is_enabled(&module).await? {
            self.cancel_locked(&module, &entity.id, "policy_disabled")
                .await?;
            return Ok(self.skip(entity, ScheduleSkip::PolicyDisabled, source_flow));
        }

        if self.universal.has_enabled(&module, &entity.id).await? {
            self.cancel_legacy(&module, &entity.id).await?;
            let count = self.universal.schedule(entity).await?;
            trace::reminders_skipped(module.as_str(), &entity.id, "universal_reminders", source_flow);
            return Ok(ScheduleOutcome::Delegated { count });
        }

        if entity.status.is_terminal() {
            let skip = ScheduleSkip::TerminalStatus(entity.kind, entity.status);
            return Ok(self.skip(entity, skip, source_flow));
        }

        let descriptors = entity
            .reminder
            .as_deref()
            .map(parse_reminder_spec)
            .unwrap_or_default();
        if descriptors.is_empty() {
            return Ok(self.skip(entity, ScheduleSkip::NoReminders, source_flow));
        }
        let Some(due_at) = entity.due_at else {
            return Ok(self.skip(entity, ScheduleSkip::NoDueTime, source_flow));
        };

        let before = self.pending_ids().await;
        let now = self.clock.now();
        let delivery = if entity.use_alarm {
            Delivery::Alarm
        } else {
            Delivery::Notification
        };

        let mut ids = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let at = due_at - Duration::minutes(i64::from(descriptor.offset_minutes));
            if at <= now {
                debug!(entity_id = %entity.id, offset = descriptor.offset_minutes, "reminder time already passed");
                continue;
            }
            let id = notification_id(&module, &entity.id, descriptor.offset_minutes);
            let payload = NotificationPayload::legacy(
                module.clone(),
                entity.id.clone(),
                "reminder",
                descriptor.offset_minutes.to_string(),
                "minutes",
            )
            .to_string();

            self.scheduler
                .schedule(ScheduleRequest {
                    id,
                    at,
                    payload: payload.clone(),
                    channel: format!("{module}_reminders"),
                    title: entity.title.clone(),
                    body: descriptor.label,
                    delivery,
                })
                .await?;
            if delivery == Delivery::Alarm {
                self.alarms.record(AlarmEntry { id, payload, at }).await?;
            }
            ids.push(id);
        }

        let after = self.pending_ids().await;
        trace::pending_delta("schedule", module.as_str(), &entity.id, source_flow, &before, &after);
        Ok(ScheduleOutcome::Scheduled { ids })
    }

    async fn cancel_locked(
        &self,
        module: &Module,
        entity_id: &str,
        reason: &str,
    ) -> Result<CancelOutcome, DaybookError> {
        let before = self.pending_ids().await;
        let cancelled = self.cancel_legacy(module, entity_id).await?;
        self.hub.cancel_for_entity(module, entity_id).await?;
        let after = self.pending_ids().await;
        trace::pending_delta("cancel", module.as_str(), entity_id, reason, &before, &after);
        Ok(CancelOutcome { cancelled })
    }

    /// Cancel OS notifications and recorded alarms whose payload names the entity.
    async fn cancel_legacy(
        &self,
        module: &Module,
        entity_id: &str,
    ) -> Result<Vec<i32>, DaybookError> {
        let mut cancelled = Vec::new();
        for pending in self.scheduler.pending().await? {
            let matches = pending
                .payload
                .as_deref()
                .and_then(|raw| NotificationPayload::parse(raw).ok())
                .is_some_and(|p| &p.module == module && p.entity_id == entity_id);
            if matches {
                self.scheduler.cancel(pending.id).await?;
                cancelled.push(pending.id);
            }
        }
        for alarm in self.alarms.take_for_entity(module, entity_id).await? {
            if !cancelled.contains(&alarm.id) {
                self.scheduler.cancel(alarm.id).await?;
                cancelled.push(alarm.id);
            }
        }
        Ok(cancelled)
    }

    fn skip(&self, entity: &TrackedEntity, skip: ScheduleSkip, source_flow: &str) -> ScheduleOutcome {
        trace::reminders_skipped(
            entity.module().as_str(),
            &entity.id,
            &skip.reason(),
            source_flow,
        );
        ScheduleOutcome::Skipped(skip)
    }

    /// Pending ids for audit records. A failing scheduler yields an empty set.
    async fn pending_ids(&self) -> BTreeSet<i32> {
        match self.scheduler.pending().await {
            Ok(pending) => pending.into_iter().map(|p| p.id).collect(),
            Err(e) => {
                warn!(error = %e, "could not list pending notifications for audit");
                BTreeSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use daybook_config::model::ModulesConfig;
    use daybook_test_utils::{
        ManualClock, MemoryKeyValueStore, MockHub, MockUniversalReminders, RecordingScheduler,
    };
    use tracing_test::traced_test;

    use crate::policy::ConfigModulePolicy;

    struct Fixture {
        coordinator: ReminderCoordinator,
        scheduler: Arc<RecordingScheduler>,
        universal: Arc<MockUniversalReminders>,
        hub: Arc<MockHub>,
        alarms: AlarmLedger,
        clock: Arc<ManualClock>,
    }

    fn fixture_with(disabled: &[&str]) -> Fixture {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let scheduler = Arc::new(RecordingScheduler::new());
        let universal = Arc::new(MockUniversalReminders::new());
        let hub = Arc::new(MockHub::new());
        let clock = Arc::new(ManualClock::fixed());
        let policy = ConfigModulePolicy::new(&ModulesConfig {
            disabled: disabled.iter().map(|m| m.to_string()).collect(),
        });
        let coordinator = ReminderCoordinator::new(
            Arc::new(EntityLockManager::new()),
            Arc::new(policy),
            universal.clone(),
            scheduler.clone(),
            hub.clone(),
            AlarmLedger::new(kv.clone()),
            clock.clone(),
        );
        Fixture {
            coordinator,
            scheduler,
            universal,
            hub,
            alarms: AlarmLedger::new(kv),
            clock,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(&[])
    }

    fn task(id: &str, reminder: &str, due_in_minutes: i64, now: DateTime<Utc>) -> TrackedEntity {
        let mut entity = TrackedEntity::new(EntityKind::Task, id, "Pay rent");
        entity.reminder = Some(reminder.to_string());
        entity.due_at = Some(now + Duration::minutes(due_in_minutes));
        entity
    }

    #[test]
    fn ids_are_stable_and_non_negative() {
        let a = notification_id(&Module::Task, "t-1", 15);
        assert_eq!(a, notification_id(&Module::Task, "t-1", 15));
        assert_ne!(a, notification_id(&Module::Task, "t-1", 60));
        assert_ne!(a, notification_id(&Module::Habit, "t-1", 15));
        assert!(a >= 0);
        assert!(snooze_notification_id(&Module::Habit, "h-1") >= 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn completed_task_is_not_scheduled() {
        let f = fixture();
        let mut entity = task("task-1", "15 minutes before", 120, f.clock.now());
        entity.status = EntityStatus::Completed;

        let outcome = f.coordinator.schedule_reminders(&entity, "edit").await.unwrap();

        assert_eq!(
            outcome,
            ScheduleOutcome::Skipped(ScheduleSkip::TerminalStatus(
                EntityKind::Task,
                EntityStatus::Completed
            ))
        );
        assert!(f.scheduler.calls().is_empty());
        assert!(logs_contain("task_status_completed"));
    }

    #[tokio::test]
    #[traced_test]
    async fn schedules_legacy_reminder_with_stable_id() {
        let f = fixture();
        let entity = task("t-1", "15 minutes before", 120, f.clock.now());

        let outcome = f.coordinator.schedule_reminders(&entity, "create").await.unwrap();

        let expected_id = notification_id(&Module::Task, "t-1", 15);
        assert_eq!(outcome, ScheduleOutcome::Scheduled { ids: vec![expected_id] });
        let scheduled = f.scheduler.scheduled();
        assert_eq!(scheduled[0].payload, "task|t-1|reminder|15|minutes");
        assert_eq!(scheduled[0].at, entity.due_at.unwrap() - Duration::minutes(15));
        assert_eq!(scheduled[0].channel, "task_reminders");
        assert_eq!(scheduled[0].body, "15 minutes before");
        assert!(logs_contain("pending_delta"));
        assert!(logs_contain(&format!("added=[{expected_id}]")));
    }

    #[tokio::test]
    async fn elapsed_reminders_are_dropped() {
        let f = fixture();
        let json = r#"[{"offsetMinutes": 60}, {"offsetMinutes": 10}]"#;
        let entity = task("t-1", json, 30, f.clock.now());

        let outcome = f.coordinator.schedule_reminders(&entity, "create").await.unwrap();
        assert_eq!(
            outcome,
            ScheduleOutcome::Scheduled {
                ids: vec![notification_id(&Module::Task, "t-1", 10)]
            }
        );
    }

    #[tokio::test]
    async fn missing_reminder_or_due_time_is_skipped() {
        let f = fixture();
        let mut entity = task("t-1", "No reminder", 30, f.clock.now());
        assert_eq!(
            f.coordinator.schedule_reminders(&entity, "edit").await.unwrap(),
            ScheduleOutcome::Skipped(ScheduleSkip::NoReminders)
        );

        entity.reminder = Some("1 hour before".into());
        entity.due_at = None;
        assert_eq!(
            f.coordinator.schedule_reminders(&entity, "edit").await.unwrap(),
            ScheduleOutcome::Skipped(ScheduleSkip::NoDueTime)
        );
        assert!(f.scheduler.calls().is_empty());
    }

    #[tokio::test]
    async fn disabled_module_cancels_existing() {
        let f = fixture_with(&["habit"]);
        let payload = "habit|h-1|reminder|5|minutes";
        f.scheduler.show(11, payload);
        let mut entity = TrackedEntity::new(EntityKind::Habit, "h-1", "Stretch");
        entity.reminder = Some("5 minutes before".into());
        entity.due_at = Some(f.clock.now() + Duration::hours(1));

        let outcome = f.coordinator.schedule_reminders(&entity, "edit").await.unwrap();
        assert_eq!(outcome, ScheduleOutcome::Skipped(ScheduleSkip::PolicyDisabled));
        assert_eq!(f.scheduler.cancelled(), vec![11]);
        assert!(f.scheduler.scheduled().is_empty());
    }

    #[tokio::test]
    async fn universal_definitions_take_over() {
        let f = fixture();
        f.scheduler.show(5, "task|t-1|reminder|15|minutes");
        f.universal.enable(&Module::Task, "t-1");
        let entity = task("t-1", "15 minutes before", 120, f.clock.now());

        let outcome = f.coordinator.schedule_reminders(&entity, "edit").await.unwrap();
        assert_eq!(outcome, ScheduleOutcome::Delegated { count: 1 });
        assert_eq!(f.scheduler.cancelled(), vec![5]);
        assert!(f.scheduler.scheduled().is_empty());
        assert_eq!(f.universal.scheduled(), vec!["t-1".to_string()]);
    }

    #[tokio::test]
    async fn cancel_covers_notifications_alarms_and_hub() {
        let f = fixture();
        let mut entity = task("t-1", "1 hour before", 180, f.clock.now());
        entity.use_alarm = true;
        f.coordinator.schedule_reminders(&entity, "create").await.unwrap();
        let alarm_id = notification_id(&Module::Task, "t-1", 60);
        assert_eq!(f.scheduler.alarm_ids(), vec![alarm_id]);
        assert!(f.scheduler.pending_ids().is_empty());

        f.scheduler.show(900, "task|t-1|reminder|15|minutes|snoozeCount:1");
        f.scheduler.show(901, "task|t-2|reminder|15|minutes");

        let outcome = f
            .coordinator
            .cancel_reminders(&Module::Task, "t-1", "edit")
            .await
            .unwrap();
        assert_eq!(outcome.cancelled, vec![900, alarm_id]);
        assert!(f.scheduler.alarm_ids().is_empty());
        assert_eq!(f.scheduler.pending_ids(), vec![901]);
        assert!(f.alarms.entries().await.unwrap().is_empty());
        assert_eq!(f.hub.cancellations(), vec![(Module::Task, "t-1".to_string())]);
    }

    #[tokio::test]
    async fn reschedule_replaces_reminders() {
        let f = fixture();
        let mut entity = task("t-1", "15 minutes before", 120, f.clock.now());
        f.coordinator.schedule_reminders(&entity, "create").await.unwrap();

        entity.reminder = Some("1 hour before".into());
        let outcome = f.coordinator.on_postponed(&entity).await.unwrap();
        assert_eq!(
            outcome.cancelled.cancelled,
            vec![notification_id(&Module::Task, "t-1", 15)]
        );
        assert_eq!(
            f.scheduler.pending_ids(),
            vec![notification_id(&Module::Task, "t-1", 60)]
        );
    }

    #[tokio::test]
    async fn deletion_purges_universal_then_cancels() {
        let f = fixture();
        f.universal.enable(&Module::Habit, "h-1");
        f.scheduler.show(3, "habit|h-1|reminder|5|minutes");

        let outcome = f.coordinator.on_deleted(&Module::Habit, "h-1").await.unwrap();
        assert_eq!(outcome.cancelled, vec![3]);
        assert_eq!(f.universal.purged(), vec![(Module::Habit, "h-1".to_string())]);
    }

    #[tokio::test]
    async fn concurrent_schedule_and_cancel_end_in_last_state() {
        let f = fixture();
        f.scheduler.set_yield_inside_calls(true);
        let entity = task("t-1", r#"[{"offsetMinutes": 5}, {"offsetMinutes": 15}, {"offsetMinutes": 30}]"#, 120, f.clock.now());

        let (s1, c1, s2, c2) = tokio::join!(
            f.coordinator.schedule_reminders(&entity, "a"),
            f.coordinator.cancel_reminders(&Module::Task, "t-1", "b"),
            f.coordinator.schedule_reminders(&entity, "c"),
            f.coordinator.cancel_reminders(&Module::Task, "t-1", "d"),
        );
        s1.unwrap();
        c1.unwrap();
        s2.unwrap();
        assert_eq!(c2.unwrap().cancelled.len(), 3);
        assert!(f.scheduler.pending_ids().is_empty());

        let (c3, s3) = tokio::join!(
            f.coordinator.cancel_reminders(&Module::Task, "t-1", "e"),
            f.coordinator.schedule_reminders(&entity, "f"),
        );
        c3.unwrap();
        s3.unwrap();
        assert_eq!(f.scheduler.pending_ids().len(), 3);
    }

    #[tokio::test]
    async fn schedule_failure_propagates() {
        let f = fixture();
        f.scheduler.set_fail_schedule(true);
        let entity = task("t-1", "15 minutes before", 120, f.clock.now());
        assert!(f.coordinator.schedule_reminders(&entity, "create").await.is_err());
    }
}
