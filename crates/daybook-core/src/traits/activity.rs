// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Side channels fed by notification handling.

use async_trait::async_trait;

use crate::error::DaybookError;
use crate::types::{ActivityEvent, NotificationPayload, TrackedEntity};

/// User-facing activity history (e.g. "snoozed").
#[async_trait]
pub trait ActivityLog: Send + Sync + 'static {
    async fn record(&self, event: ActivityEvent) -> Result<(), DaybookError>;
}

/// Surfaces an entity to the user after a notification tap.
#[async_trait]
pub trait InteractionPresenter: Send + Sync + 'static {
    async fn present(
        &self,
        entity: &TrackedEntity,
        payload: &NotificationPayload,
    ) -> Result<(), DaybookError>;
}
