// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-module enablement and snooze settings.

use async_trait::async_trait;

use crate::error::DaybookError;
use crate::types::{EntityKind, Module, SnoozeSettings};

/// Whether notifications for a module are currently enabled by the user.
#[async_trait]
pub trait ModulePolicy: Send + Sync + 'static {
    async fn is_enabled(&self, module: &Module) -> Result<bool, DaybookError>;
}

/// Resolves the unified snooze settings for task or habit entities.
#[async_trait]
pub trait SnoozeSettingsProvider: Send + Sync + 'static {
    async fn snooze_settings(&self, kind: EntityKind) -> Result<SnoozeSettings, DaybookError>;
}
