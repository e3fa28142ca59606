// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OS-level notification scheduling primitives.

use async_trait::async_trait;

use crate::error::DaybookError;
use crate::types::{PendingNotification, ScheduleRequest};

/// The platform notification scheduler.
#[async_trait]
pub trait NotificationScheduler: Send + Sync + 'static {
    /// Schedule (or replace) the notification with `request.id`.
    async fn schedule(&self, request: ScheduleRequest) -> Result<(), DaybookError>;

    /// Cancel a notification or alarm. Cancelling an unknown id is a no-op.
    async fn cancel(&self, id: i32) -> Result<(), DaybookError>;

    /// Notifications that are scheduled or currently shown.
    async fn pending(&self) -> Result<Vec<PendingNotification>, DaybookError>;
}
