// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification lifecycle coordination for Daybook.
//!
//! - [`lock`]: per-entity FIFO locking shared by every mutating operation
//! - [`coordinator`]: scheduling, cancelling, and rescheduling task/habit reminders
//! - [`router`]: handling taps and actions, deferring them while the device is locked
//! - [`snooze`]: snooze history and rescheduling
//! - [`deferred`] / [`replay`] / [`alarms`]: state persisted in the key-value store
//! - [`hub`]: dispatch to other modules

pub mod alarms;
pub mod coordinator;
pub mod deferred;
pub mod hub;
pub mod lock;
pub mod policy;
pub mod reminder;
pub mod replay;
pub mod repos;
pub mod router;
pub mod snooze;
pub mod trace;

pub use alarms::{AlarmEntry, AlarmLedger};
pub use coordinator::{
    CancelOutcome, ReminderCoordinator, RescheduleOutcome, ScheduleOutcome, ScheduleSkip,
};
pub use deferred::{DeferredInteraction, DeferredInteractionStore};
pub use hub::{AdapterHub, ModuleAdapter};
pub use lock::EntityLockManager;
pub use policy::{ConfigModulePolicy, ConfigSnoozeSettings, NeverLocked, StoredModulePolicy};
pub use reminder::{parse_reminder_json, parse_reminder_spec, parse_reminder_string};
pub use replay::ReplayDetector;
pub use repos::EntityRepositories;
pub use router::{
    Dispatch, DropReason, NotificationActionRouter, RouteOutcome, RouterSettings, SkipReason,
};
pub use snooze::{SnoozeOutcome, SnoozeStatePersister};
