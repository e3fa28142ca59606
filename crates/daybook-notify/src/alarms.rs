// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bookkeeping for native alarm-manager entries.
//!
//! The platform cannot list scheduled alarms, so every alarm-delivery reminder
//! is recorded here and cancellation matches against this ledger by payload.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use daybook_core::{DaybookError, KeyValueStore, Module, NotificationPayload};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ALARM_LEDGER_KEY: &str = "native_alarm_ledger";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmEntry {
    pub id: i32,
    pub payload: String,
    pub at: DateTime<Utc>,
}

impl AlarmEntry {
    fn belongs_to(&self, module: &Module, entity_id: &str) -> bool {
        NotificationPayload::parse(&self.payload)
            .map(|p| &p.module == module && p.entity_id == entity_id)
            .unwrap_or(false)
    }
}

pub struct AlarmLedger {
    kv: Arc<dyn KeyValueStore>,
}

impl AlarmLedger {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn entries(&self) -> Result<Vec<AlarmEntry>, DaybookError> {
        let Some(raw) = self.kv.get_string(ALARM_LEDGER_KEY).await? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "alarm ledger is corrupt, treating as empty");
            Vec::new()
        }))
    }

    /// Record an alarm, replacing any entry with the same id.
    pub async fn record(&self, entry: AlarmEntry) -> Result<(), DaybookError> {
        let mut entries = self.entries().await?;
        entries.retain(|e| e.id != entry.id);
        entries.push(entry);
        self.save(&entries).await
    }

    /// Remove and return every entry whose payload names this entity.
    pub async fn take_for_entity(
        &self,
        module: &Module,
        entity_id: &str,
    ) -> Result<Vec<AlarmEntry>, DaybookError> {
        let (matched, kept): (Vec<_>, Vec<_>) = self
            .entries()
            .await?
            .into_iter()
            .partition(|e| e.belongs_to(module, entity_id));
        if !matched.is_empty() {
            self.save(&kept).await?;
        }
        Ok(matched)
    }

    async fn save(&self, entries: &[AlarmEntry]) -> Result<(), DaybookError> {
        if entries.is_empty() {
            return self.kv.remove(ALARM_LEDGER_KEY).await;
        }
        let raw = serde_json::to_string(entries)?;
        self.kv.set_string(ALARM_LEDGER_KEY, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_test_utils::MemoryKeyValueStore;

    fn entry(id: i32, payload: &str) -> AlarmEntry {
        AlarmEntry {
            id,
            payload: payload.to_string(),
            at: DateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn take_matches_by_payload_entity() {
        let ledger = AlarmLedger::new(Arc::new(MemoryKeyValueStore::new()));
        ledger.record(entry(1, "task|t-1|reminder|5|minutes")).await.unwrap();
        ledger.record(entry(2, "task|t-1|reminder|60|minutes")).await.unwrap();
        ledger.record(entry(3, "task|t-2|reminder|5|minutes")).await.unwrap();
        ledger.record(entry(4, "habit|t-1|reminder|5|minutes")).await.unwrap();

        let taken = ledger.take_for_entity(&Module::Task, "t-1").await.unwrap();
        assert_eq!(taken.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
        let left: Vec<i32> = ledger.entries().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(left, vec![3, 4]);
    }

    #[tokio::test]
    async fn record_replaces_same_id() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let ledger = AlarmLedger::new(kv.clone());
        ledger.record(entry(1, "task|a")).await.unwrap();
        ledger.record(entry(1, "task|b")).await.unwrap();
        assert_eq!(ledger.entries().await.unwrap(), vec![entry(1, "task|b")]);

        ledger.take_for_entity(&Module::Task, "b").await.unwrap();
        assert!(!kv.contains(ALARM_LEDGER_KEY));
    }
}
