// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository trait for task and habit entities.

use async_trait::async_trait;

use crate::error::DaybookError;
use crate::types::TrackedEntity;

/// CRUD access to one kind of tracked entity.
#[async_trait]
pub trait EntityRepository: Send + Sync + 'static {
    /// Fetch an entity. `Ok(None)` means it does not exist.
    async fn get_by_id(&self, id: &str) -> Result<Option<TrackedEntity>, DaybookError>;

    /// Persist the full entity state, including snooze history.
    async fn update(&self, entity: &TrackedEntity) -> Result<(), DaybookError>;

    async fn exists(&self, id: &str) -> Result<bool, DaybookError> {
        Ok(self.get_by_id(id).await?.is_some())
    }
}
