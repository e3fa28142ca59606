// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.

use metrics::{describe_counter, describe_gauge};

pub const EVENTS_TOTAL: &str = "daybook_notification_events_total";
pub const SKIPS_TOTAL: &str = "daybook_notification_skips_total";
pub const REMINDERS_SCHEDULED_TOTAL: &str = "daybook_reminders_scheduled_total";
pub const LOCKS_IN_FLIGHT: &str = "daybook_entity_locks_in_flight";

/// Register all Daybook metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        EVENTS_TOTAL,
        "Notification interactions by outcome (deferred, redeferred, skipped, dispatched)"
    );
    describe_counter!(SKIPS_TOTAL, "Skipped notification interactions by reason");
    describe_counter!(
        REMINDERS_SCHEDULED_TOTAL,
        "Reminders handed to the OS scheduler"
    );
    describe_gauge!(
        LOCKS_IN_FLIGHT,
        "Entity keys with a lifecycle operation running or queued"
    );
}

pub fn record_event(outcome: &str) {
    metrics::counter!(EVENTS_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

pub fn record_skip(reason: &str) {
    metrics::counter!(SKIPS_TOTAL, "reason" => reason.to_string()).increment(1);
}

pub fn record_scheduled(module: &str, count: usize) {
    metrics::counter!(REMINDERS_SCHEDULED_TOTAL, "module" => module.to_string())
        .increment(count as u64);
}

pub fn set_locks_in_flight(keys: usize) {
    metrics::gauge!(LOCKS_IN_FLIGHT).set(keys as f64);
}
