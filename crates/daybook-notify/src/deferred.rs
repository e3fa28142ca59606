// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-slot store for a notification interaction received while the
//! device was locked.
//!
//! The slot lives in the durable key-value store as four keys so that it
//! survives process death. A native receiver may write the slot directly, so
//! [`DeferredInteractionStore::take`] reloads the store before reading.
//!
//! The payload key marks the slot as present. It is removed before the other
//! keys are rewritten and written after them, so a failed store never leaves
//! a new payload next to an older interaction's action or notification id.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use daybook_core::{DaybookError, KeyValueStore};
use tracing::{debug, warn};

use crate::replay;

pub const PAYLOAD_KEY: &str = "pending_tap_payload";
pub const ACTION_ID_KEY: &str = "pending_tap_action_id";
pub const NOTIFICATION_ID_KEY: &str = "pending_tap_notification_id";
pub const STORED_AT_KEY: &str = "pending_tap_stored_at";

/// An interaction waiting for the device to be unlocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredInteraction {
    pub payload: String,
    /// Empty for a plain tap.
    pub action_id: String,
    pub notification_id: Option<i32>,
    pub stored_at: DateTime<Utc>,
}

impl DeferredInteraction {
    pub fn new(
        payload: impl Into<String>,
        action_id: impl Into<String>,
        notification_id: Option<i32>,
        stored_at: DateTime<Utc>,
    ) -> Self {
        Self {
            payload: payload.into(),
            action_id: action_id.into(),
            notification_id,
            stored_at,
        }
    }

    pub fn is_tap(&self) -> bool {
        self.action_id.is_empty()
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.stored_at
    }

    /// Replay-ledger signature of this interaction.
    pub fn signature(&self) -> String {
        replay::signature(&self.payload, &self.action_id, self.notification_id)
    }
}

pub struct DeferredInteractionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl DeferredInteractionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Persist `interaction`, replacing whatever the slot held.
    ///
    /// On error the slot is left empty rather than partially rewritten.
    pub async fn store(&self, interaction: &DeferredInteraction) -> Result<(), DaybookError> {
        self.kv.remove(PAYLOAD_KEY).await?;
        if let Err(e) = self.write_fields(interaction).await {
            self.discard_partial().await;
            return Err(e);
        }
        debug!(payload = %interaction.payload, "deferred interaction stored");
        Ok(())
    }

    async fn write_fields(&self, interaction: &DeferredInteraction) -> Result<(), DaybookError> {
        self.kv
            .set_string(ACTION_ID_KEY, &interaction.action_id)
            .await?;
        match interaction.notification_id {
            Some(id) => self.kv.set_int(NOTIFICATION_ID_KEY, i64::from(id)).await?,
            None => self.kv.remove(NOTIFICATION_ID_KEY).await?,
        }
        self.kv
            .set_int(STORED_AT_KEY, interaction.stored_at.timestamp_millis())
            .await?;
        self.kv.set_string(PAYLOAD_KEY, &interaction.payload).await
    }

    /// Best-effort removal of whatever a failed store managed to write.
    async fn discard_partial(&self) {
        for key in [PAYLOAD_KEY, ACTION_ID_KEY, NOTIFICATION_ID_KEY, STORED_AT_KEY] {
            if let Err(e) = self.kv.remove(key).await {
                warn!(key, error = %e, "failed to discard partially written deferred slot");
            }
        }
    }

    /// Read the slot without clearing it.
    pub async fn peek(&self) -> Result<Option<DeferredInteraction>, DaybookError> {
        let Some(payload) = self.kv.get_string(PAYLOAD_KEY).await? else {
            return Ok(None);
        };
        let action_id = self.kv.get_string(ACTION_ID_KEY).await?.unwrap_or_default();
        let notification_id = self
            .kv
            .get_int(NOTIFICATION_ID_KEY)
            .await?
            .and_then(|id| i32::try_from(id).ok());
        // A slot without a readable timestamp is treated as arbitrarily old.
        let stored_at = self
            .kv
            .get_int(STORED_AT_KEY)
            .await?
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or(DateTime::UNIX_EPOCH);

        Ok(Some(DeferredInteraction {
            payload,
            action_id,
            notification_id,
            stored_at,
        }))
    }

    /// Reload from durable storage, then read and clear the slot.
    ///
    /// Once read, the interaction is returned even if clearing fails; the
    /// replay ledger guards against processing it twice.
    pub async fn take(&self) -> Result<Option<DeferredInteraction>, DaybookError> {
        if let Err(e) = self.kv.reload().await {
            warn!(error = %e, "reload before reading deferred slot failed, using cached values");
        }
        let interaction = self.peek().await?;
        if interaction.is_some()
            && let Err(e) = self.clear().await
        {
            warn!(error = %e, "failed to clear deferred slot after reading it");
        }
        Ok(interaction)
    }

    pub async fn clear(&self) -> Result<(), DaybookError> {
        for key in [PAYLOAD_KEY, ACTION_ID_KEY, NOTIFICATION_ID_KEY, STORED_AT_KEY] {
            self.kv.remove(key).await?;
        }
        Ok(())
    }
}
