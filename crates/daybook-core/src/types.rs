// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across collaborator trait boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::DaybookError;

/// Segment prefix carrying the snooze counter inside a payload string.
pub const SNOOZE_COUNT_PREFIX: &str = "snoozeCount:";

/// A functional area (task, habit, finance, sleep, ...) that owns notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Module {
    Task,
    Habit,
    /// Any module routed through the adapter hub. Ids are lowercased.
    Other(String),
}

impl Module {
    /// The module id as it appears in payloads and lock keys.
    pub fn as_str(&self) -> &str {
        match self {
            Module::Task => "task",
            Module::Habit => "habit",
            Module::Other(id) => id,
        }
    }

    /// The entity kind backing this module, if it has first-party repositories.
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            Module::Task => Some(EntityKind::Task),
            Module::Habit => Some(EntityKind::Habit),
            Module::Other(_) => None,
        }
    }

    /// Returns true for task and habit, whose entities live in local repositories.
    pub fn is_entity_backed(&self) -> bool {
        self.entity_kind().is_some()
    }
}

impl From<&str> for Module {
    fn from(id: &str) -> Self {
        let id = id.trim();
        if id.eq_ignore_ascii_case("task") {
            Module::Task
        } else if id.eq_ignore_ascii_case("habit") {
            Module::Habit
        } else {
            Module::Other(id.to_lowercase())
        }
    }
}

impl From<String> for Module {
    fn from(id: String) -> Self {
        Module::from(id.as_str())
    }
}

impl From<Module> for String {
    fn from(module: Module) -> Self {
        module.as_str().to_string()
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of entities with first-party repositories and snooze history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Task,
    Habit,
}

impl EntityKind {
    /// The module this entity kind belongs to.
    pub fn module(self) -> Module {
        match self {
            EntityKind::Task => Module::Task,
            EntityKind::Habit => Module::Habit,
        }
    }
}

/// Lifecycle status of a task or habit occurrence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    #[default]
    Pending,
    InProgress,
    Postponed,
    Completed,
    NotDone,
}

impl EntityStatus {
    /// Terminal statuses never receive reminders.
    pub fn is_terminal(self) -> bool {
        matches!(self, EntityStatus::Completed | EntityStatus::NotDone)
    }
}

/// Which grammar a payload string was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum PayloadFormat {
    /// `moduleId|entityId|reminderType|value|unit`
    Legacy,
    /// `moduleId,entityId,...`
    Hub,
}

/// Structured view of the opaque string attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub module: Module,
    pub entity_id: String,
    pub reminder_type: Option<String>,
    pub value: Option<String>,
    pub unit: Option<String>,
    /// Number of times this notification has already been snoozed.
    pub snooze_count: Option<u32>,
    pub format: PayloadFormat,
    /// Trailing segments this crate does not interpret.
    pub extra: Vec<String>,
}

impl NotificationPayload {
    /// Build a legacy-format payload for a scheduled reminder.
    pub fn legacy(
        module: Module,
        entity_id: impl Into<String>,
        reminder_type: impl Into<String>,
        value: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            module,
            entity_id: entity_id.into(),
            reminder_type: Some(reminder_type.into()),
            value: Some(value.into()),
            unit: Some(unit.into()),
            snooze_count: None,
            format: PayloadFormat::Legacy,
            extra: Vec::new(),
        }
    }

    /// Parse a payload string in either the legacy or the hub grammar.
    ///
    /// Fails when the module id or entity id is missing or empty.
    pub fn parse(raw: &str) -> Result<Self, DaybookError> {
        let raw = raw.trim();
        let (separator, format) = if raw.contains('|') {
            ('|', PayloadFormat::Legacy)
        } else if raw.contains(',') {
            (',', PayloadFormat::Hub)
        } else {
            return Err(DaybookError::InvalidPayload(format!(
                "no segment separator in `{raw}`"
            )));
        };

        let mut snooze_count = None;
        let mut segments = Vec::new();
        for segment in raw.split(separator) {
            let segment = segment.trim();
            if let Some(count) = segment.strip_prefix(SNOOZE_COUNT_PREFIX) {
                if let Ok(count) = count.trim().parse::<u32>() {
                    snooze_count = Some(count);
                }
                continue;
            }
            segments.push(segment.to_string());
        }

        let mut segments = segments.into_iter();
        let module_id = segments.next().unwrap_or_default();
        let entity_id = segments.next().unwrap_or_default();
        if module_id.is_empty() || entity_id.is_empty() {
            return Err(DaybookError::InvalidPayload(format!(
                "missing module or entity id in `{raw}`"
            )));
        }

        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
        let (reminder_type, value, unit) = match format {
            PayloadFormat::Legacy => (
                non_empty(segments.next()),
                non_empty(segments.next()),
                non_empty(segments.next()),
            ),
            PayloadFormat::Hub => (None, None, None),
        };

        Ok(Self {
            module: Module::from(module_id),
            entity_id,
            reminder_type,
            value,
            unit,
            snooze_count,
            format,
            extra: segments.collect(),
        })
    }

    /// Return a copy carrying the given snooze counter.
    pub fn with_snooze_count(&self, count: u32) -> Self {
        Self {
            snooze_count: Some(count),
            ..self.clone()
        }
    }

    /// Returns true when `other` refers to the same module and entity.
    pub fn same_entity(&self, other: &NotificationPayload) -> bool {
        self.module == other.module && self.entity_id == other.entity_id
    }
}

impl std::fmt::Display for NotificationPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counter = self
            .snooze_count
            .map(|count| format!("{SNOOZE_COUNT_PREFIX}{count}"));
        let mut segments: Vec<&str> = vec![self.module.as_str(), &self.entity_id];
        let separator = match self.format {
            PayloadFormat::Legacy => {
                let has_details = self.reminder_type.is_some()
                    || self.value.is_some()
                    || self.unit.is_some()
                    || !self.extra.is_empty();
                if has_details {
                    segments.push(self.reminder_type.as_deref().unwrap_or(""));
                    segments.push(self.value.as_deref().unwrap_or(""));
                    segments.push(self.unit.as_deref().unwrap_or(""));
                }
                "|"
            }
            PayloadFormat::Hub => ",",
        };
        segments.extend(self.extra.iter().map(String::as_str));
        if let Some(counter) = counter.as_deref() {
            segments.push(counter);
        }

        f.write_str(&segments.join(separator))
    }
}

/// One entry in an entity's append-only snooze history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnoozeRecord {
    /// When the snooze was requested.
    pub at: DateTime<Utc>,
    pub minutes: u32,
    /// When the snoozed notification fires again.
    pub until: DateTime<Utc>,
    /// 1-based ordinal of this snooze for the entity.
    pub count: u32,
    /// Where the snooze came from (e.g. `notification_action`).
    pub source: String,
    pub notification_id: Option<i32>,
    pub payload: String,
}

/// A task or habit that can own scheduled reminders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub kind: EntityKind,
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: EntityStatus,
    /// Anchor time reminders are computed relative to.
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    /// Legacy free-text reminder description or a JSON reminder list.
    #[serde(default)]
    pub reminder: Option<String>,
    /// Deliver through the native alarm path instead of a plain notification.
    #[serde(default)]
    pub use_alarm: bool,
    #[serde(default)]
    pub snoozed_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub snooze_history: Vec<SnoozeRecord>,
}

impl TrackedEntity {
    /// Create a pending entity with no reminders.
    pub fn new(kind: EntityKind, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            title: title.into(),
            status: EntityStatus::Pending,
            due_at: None,
            reminder: None,
            use_alarm: false,
            snoozed_until: None,
            snooze_history: Vec::new(),
        }
    }

    pub fn module(&self) -> Module {
        self.kind.module()
    }

    /// Count carried by the most recent snooze record, or 0.
    pub fn last_snooze_count(&self) -> u32 {
        self.snooze_history.last().map_or(0, |r| r.count)
    }

    /// Append a snooze record and move `snoozed_until` to its end time.
    pub fn record_snooze(&mut self, record: SnoozeRecord) {
        self.snoozed_until = Some(record.until);
        self.snooze_history.push(record);
    }
}

/// A single reminder offset relative to an entity's anchor time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDescriptor {
    /// Minutes before the anchor; 0 fires at the anchor itself.
    pub offset_minutes: u32,
    pub label: String,
}

impl ReminderDescriptor {
    /// Canonical "N minutes before" reminder.
    pub fn before(minutes: u32) -> Self {
        let label = match minutes {
            0 => "at task time".to_string(),
            60 => "1 hour before".to_string(),
            1440 => "1 day before".to_string(),
            m => format!("{m} minutes before"),
        };
        Self {
            offset_minutes: minutes,
            label,
        }
    }

    /// Reminder at the anchor time.
    pub fn at_time() -> Self {
        Self::before(0)
    }
}

/// A notification currently known to the OS scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub id: i32,
    pub payload: Option<String>,
    /// Scheduler-specific category (e.g. `reminder`, `snooze`).
    pub kind: Option<String>,
}

/// How a scheduled reminder is delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    Notification,
    /// Native alarm-manager entry; the platform offers no way to list these.
    Alarm,
}

/// A request to schedule one OS-level notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub id: i32,
    pub at: DateTime<Utc>,
    pub payload: String,
    pub channel: String,
    pub title: String,
    pub body: String,
    pub delivery: Delivery,
}

/// Effective snooze settings for an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnoozeSettings {
    pub default_minutes: u32,
    pub max_minutes: u32,
}

/// An entry for the user-facing activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Unique event identifier (UUID v4).
    pub id: String,
    pub module: Module,
    pub entity_id: String,
    pub kind: String,
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ActivityEvent {
    pub fn new(
        module: Module,
        entity_id: impl Into<String>,
        kind: impl Into<String>,
        at: DateTime<Utc>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            module,
            entity_id: entity_id.into(),
            kind: kind.into(),
            at,
            detail,
        }
    }
}

/// Source of the current time. Injected so staleness and TTL logic is testable.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A configured number of seconds as a duration, saturating at the largest
/// representable value.
pub fn seconds(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}
