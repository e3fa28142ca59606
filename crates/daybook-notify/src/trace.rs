// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured audit records for the notification lifecycle.
//!
//! Every record is emitted at target [`TRACE_TARGET`] with an `event` field and,
//! for skips, a machine-readable `reason`. With the `prometheus` feature the
//! same calls feed the counters in `daybook-prometheus`.

use std::collections::BTreeSet;

use tracing::info;

pub const TRACE_TARGET: &str = "daybook::trace";

/// Where in the router a record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Handling a response as it arrived.
    Live,
    /// Replaying an interaction from the deferred slot.
    Deferred,
}

pub fn notification_skipped(stage: Stage, reason: &str, payload: &str) {
    info!(
        target: TRACE_TARGET,
        event = "notification_skipped",
        stage = %stage,
        reason,
        payload,
        "notification interaction skipped"
    );
    #[cfg(feature = "prometheus")]
    {
        daybook_prometheus::record_event("skipped");
        daybook_prometheus::record_skip(reason);
    }
}

pub fn notification_deferred(payload: &str, action_id: &str, redeferred: bool) {
    info!(
        target: TRACE_TARGET,
        event = "notification_deferred",
        payload,
        action_id,
        redeferred,
        "notification interaction deferred until unlock"
    );
    #[cfg(feature = "prometheus")]
    daybook_prometheus::record_event(if redeferred { "redeferred" } else { "deferred" });
}

pub fn notification_dispatched(stage: Stage, dispatch: &str, payload: &str) {
    info!(
        target: TRACE_TARGET,
        event = "notification_dispatched",
        stage = %stage,
        dispatch,
        payload,
        "notification interaction dispatched"
    );
    #[cfg(feature = "prometheus")]
    daybook_prometheus::record_event("dispatched");
}

pub fn reminders_skipped(module: &str, entity_id: &str, reason: &str, source: &str) {
    info!(
        target: TRACE_TARGET,
        event = "reminders_skipped",
        module,
        entity_id,
        reason,
        source,
        "reminder scheduling skipped"
    );
}

/// Audit of a schedule/cancel operation as seen through the scheduler's pending list.
pub fn pending_delta(
    operation: &str,
    module: &str,
    entity_id: &str,
    reason: &str,
    before: &BTreeSet<i32>,
    after: &BTreeSet<i32>,
) {
    let added: Vec<i32> = after.difference(before).copied().collect();
    let removed: Vec<i32> = before.difference(after).copied().collect();
    info!(
        target: TRACE_TARGET,
        event = "pending_delta",
        operation,
        module,
        entity_id,
        reason,
        before = ?before,
        after = ?after,
        added = ?added,
        removed = ?removed,
        "pending notifications changed"
    );
    #[cfg(feature = "prometheus")]
    if operation == "schedule" && !added.is_empty() {
        daybook_prometheus::record_scheduled(module, added.len());
    }
}
