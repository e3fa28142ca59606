// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snoozing task and habit notifications.
//!
//! A snooze appends a [`SnoozeRecord`] to the entity's history under the
//! entity lock, then reschedules the notification with an incremented
//! `snoozeCount`. History is best-effort: if the entity cannot be loaded or
//! saved the snoozed notification is still scheduled.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use daybook_core::{
    ActivityEvent, ActivityLog, Clock, DaybookError, Delivery, EntityKind, NotificationPayload,
    NotificationScheduler, ScheduleRequest, SnoozeRecord, SnoozeSettings, SnoozeSettingsProvider,
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::coordinator::snooze_notification_id;
use crate::lock::EntityLockManager;
use crate::repos::EntityRepositories;

/// Used when the settings provider fails.
pub const FALLBACK_SNOOZE: SnoozeSettings = SnoozeSettings {
    default_minutes: 10,
    max_minutes: 24 * 60,
};

pub const SNOOZE_SOURCE: &str = "notification_action";
pub const SNOOZE_CHANNEL: &str = "snoozed_reminders";

/// Result of a snooze request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnoozeOutcome {
    pub notification_id: i32,
    pub minutes: u32,
    pub until: DateTime<Utc>,
    /// Snooze count carried by the rescheduled payload.
    pub count: u32,
    /// False when the history append failed and only the notification was rescheduled.
    pub history_persisted: bool,
}

pub struct SnoozeStatePersister {
    locks: Arc<EntityLockManager>,
    repos: EntityRepositories,
    settings: Arc<dyn SnoozeSettingsProvider>,
    scheduler: Arc<dyn NotificationScheduler>,
    activity: Arc<dyn ActivityLog>,
    clock: Arc<dyn Clock>,
}

impl SnoozeStatePersister {
    pub fn new(
        locks: Arc<EntityLockManager>,
        repos: EntityRepositories,
        settings: Arc<dyn SnoozeSettingsProvider>,
        scheduler: Arc<dyn NotificationScheduler>,
        activity: Arc<dyn ActivityLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            locks,
            repos,
            settings,
            scheduler,
            activity,
            clock,
        }
    }

    /// Snooze the notification for `entity_id`.
    ///
    /// `override_minutes` (from a `snooze_<minutes>` action) replaces the
    /// configured default and is clamped to `1..=max_minutes`. Fails only when
    /// the snoozed notification could not be scheduled.
    pub async fn snooze(
        &self,
        kind: EntityKind,
        entity_id: &str,
        payload: &NotificationPayload,
        notification_id: Option<i32>,
        override_minutes: Option<u32>,
    ) -> Result<SnoozeOutcome, DaybookError> {
        let settings = match self.settings.snooze_settings(kind).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, kind = %kind, "snooze settings unavailable, using fallback");
                FALLBACK_SNOOZE
            }
        };
        let minutes = effective_minutes(settings, override_minutes);
        let now = self.clock.now();
        let until = now + Duration::minutes(i64::from(minutes));
        let module = kind.module();
        let id = notification_id
            .unwrap_or_else(|| snooze_notification_id(&module, entity_id));

        let history = self
            .append_history(kind, entity_id, payload, Some(id), minutes, now, until)
            .await;
        let (count, title, history_persisted) = match history {
            Ok((count, title)) => (count, title, true),
            Err(e) => {
                warn!(
                    error = %e,
                    module = %module,
                    entity_id,
                    "snooze history not recorded, rescheduling anyway"
                );
                let count = payload.snooze_count.unwrap_or(0).saturating_add(1);
                (count, format!("Snoozed {kind}"), false)
            }
        };

        let snoozed = payload.with_snooze_count(count);
        self.scheduler
            .schedule(ScheduleRequest {
                id,
                at: until,
                payload: snoozed.to_string(),
                channel: SNOOZE_CHANNEL.to_string(),
                title,
                body: format!("Snoozed for {minutes} minutes"),
                delivery: Delivery::Notification,
            })
            .await?;
        info!(module = %module, entity_id, minutes, count, "notification snoozed");

        self.log_activity(ActivityEvent::new(
            module,
            entity_id,
            "snoozed",
            now,
            json!({ "minutes": minutes, "until": until, "count": count }),
        ));

        Ok(SnoozeOutcome {
            notification_id: id,
            minutes,
            until,
            count,
            history_persisted,
        })
    }

    /// Append a snooze record under the entity lock. Returns the new count and
    /// the entity title.
    #[allow(clippy::too_many_arguments)]
    async fn append_history(
        &self,
        kind: EntityKind,
        entity_id: &str,
        payload: &NotificationPayload,
        notification_id: Option<i32>,
        minutes: u32,
        at: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<(u32, String), DaybookError> {
        let repo = self.repos.for_kind(kind);
        let module = kind.module();
        self.locks
            .run_exclusive(module.as_str(), entity_id, || async {
                let mut entity =
                    repo.get_by_id(entity_id)
                        .await?
                        .ok_or_else(|| DaybookError::EntityNotFound {
                            module: module.to_string(),
                            id: entity_id.to_string(),
                        })?;
                let count = payload
                    .snooze_count
                    .unwrap_or(0)
                    .max(entity.last_snooze_count())
                    .saturating_add(1);
                entity.record_snooze(SnoozeRecord {
                    at,
                    minutes,
                    until,
                    count,
                    source: SNOOZE_SOURCE.to_string(),
                    notification_id,
                    payload: payload.to_string(),
                });
                repo.update(&entity).await?;
                debug!(entity_id, count, "snooze history appended");
                Ok::<_, DaybookError>((count, entity.title))
            })
            .await
    }

    fn log_activity(&self, event: ActivityEvent) {
        let activity = self.activity.clone();
        tokio::spawn(async move {
            if let Err(e) = activity.record(event).await {
                warn!(error = %e, "failed to record snooze activity");
            }
        });
    }
}

fn effective_minutes(settings: SnoozeSettings, override_minutes: Option<u32>) -> u32 {
    let max = settings.max_minutes.max(1);
    override_minutes
        .unwrap_or(settings.default_minutes)
        .clamp(1, max)
}

/// Parse a snooze action id: `snooze` uses the default duration and
/// `snooze_<minutes>` overrides it. Returns `None` for other actions.
pub fn parse_snooze_action(action_id: &str) -> Option<Option<u32>> {
    if action_id == "snooze" {
        return Some(None);
    }
    let minutes = action_id.strip_prefix("snooze_")?;
    Some(minutes.parse::<u32>().ok().filter(|m| *m > 0))
}
