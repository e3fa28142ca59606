// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch surface for modules other than task and habit.

use async_trait::async_trait;

use crate::error::DaybookError;
use crate::types::Module;

/// Pluggable handlers for notification taps and actions.
///
/// Every method reports `false` (or does nothing) when no adapter claims the
/// payload's module.
#[async_trait]
pub trait ModuleAdapterHub: Send + Sync + 'static {
    async fn handle_tap(&self, payload: &str) -> Result<bool, DaybookError>;

    async fn handle_action(
        &self,
        action_id: &str,
        payload: &str,
        notification_id: Option<i32>,
    ) -> Result<bool, DaybookError>;

    /// Generic snooze without module-specific history.
    async fn snooze(
        &self,
        payload: &str,
        notification_id: Option<i32>,
        minutes: Option<u32>,
    ) -> Result<bool, DaybookError>;

    async fn cancel_for_entity(&self, module: &Module, entity_id: &str)
        -> Result<(), DaybookError>;
}
