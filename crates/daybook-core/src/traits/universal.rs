// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The structured ("universal") reminder subsystem.

use async_trait::async_trait;

use crate::error::DaybookError;
use crate::types::{Module, TrackedEntity};

/// Newer reminder definitions that supersede the legacy free-text field.
///
/// When an entity has enabled universal definitions, scheduling is handed
/// over to this subsystem entirely.
#[async_trait]
pub trait UniversalReminders: Send + Sync + 'static {
    async fn has_enabled(&self, module: &Module, entity_id: &str) -> Result<bool, DaybookError>;

    /// Schedule the entity's universal reminders. Returns how many were scheduled.
    async fn schedule(&self, entity: &TrackedEntity) -> Result<usize, DaybookError>;

    /// Delete every universal definition owned by the entity.
    async fn purge(&self, module: &Module, entity_id: &str) -> Result<(), DaybookError>;
}
