// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Daybook notification subsystem.
//!
//! This crate provides the error type, the payload grammar, entity and
//! snooze-history types, and the collaborator traits that the coordination
//! core in `daybook-notify` is written against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::DaybookError;
pub use types::{
    ActivityEvent, Clock, Delivery, EntityKind, EntityStatus, Module, NotificationPayload,
    PayloadFormat, PendingNotification, ReminderDescriptor, ScheduleRequest, SnoozeRecord,
    SnoozeSettings, SystemClock, TrackedEntity, seconds,
};

pub use traits::{
    ActivityLog, EntityRepository, InteractionPresenter, KeyValueStore, LockStateOracle,
    ModuleAdapterHub, ModulePolicy, NotificationScheduler, SnoozeSettingsProvider,
    UniversalReminders,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daybook_error_variants_render() {
        let not_found = DaybookError::EntityNotFound {
            module: "task".into(),
            id: "t-1".into(),
        };
        assert_eq!(not_found.to_string(), "task entity not found: t-1");

        let storage = DaybookError::storage(std::io::Error::other("disk full"));
        assert_eq!(storage.to_string(), "storage error: disk full");

        let payload = DaybookError::InvalidPayload("empty".into());
        assert!(payload.to_string().contains("empty"));
    }

    #[test]
    fn all_collaborator_traits_are_exported() {
        fn _assert_kv<T: KeyValueStore>() {}
        fn _assert_oracle<T: LockStateOracle>() {}
        fn _assert_repo<T: EntityRepository>() {}
        fn _assert_scheduler<T: NotificationScheduler>() {}
        fn _assert_hub<T: ModuleAdapterHub>() {}
        fn _assert_policy<T: ModulePolicy>() {}
        fn _assert_settings<T: SnoozeSettingsProvider>() {}
        fn _assert_activity<T: ActivityLog>() {}
        fn _assert_presenter<T: InteractionPresenter>() {}
        fn _assert_universal<T: UniversalReminders>() {}
    }

    #[test]
    fn entity_kind_round_trips_through_strum() {
        use std::str::FromStr;
        for kind in [EntityKind::Task, EntityKind::Habit] {
            assert_eq!(EntityKind::from_str(&kind.to_string()).unwrap(), kind);
            assert_eq!(kind.module().entity_kind(), Some(kind));
        }
    }
}
