// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TTL-bounded ledger of processed deferred interactions.
//!
//! The ledger maps interaction signatures to the time they were processed and
//! is stored as a JSON object under [`REPLAY_LEDGER_KEY`]. Entries older than
//! the TTL are pruned whenever the ledger is read or written, so it stays
//! small without a background task.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use daybook_config::model::NotificationsConfig;
use daybook_core::{Clock, DaybookError, KeyValueStore};
use tracing::{debug, warn};

pub const REPLAY_LEDGER_KEY: &str = "notification_replay_ledger";

/// Identity of an interaction: `payload|action:<id>|id:<notifId>`.
///
/// A tap (empty action) is written as `tap`; a missing notification id as an
/// empty string.
pub fn signature(payload: &str, action_id: &str, notification_id: Option<i32>) -> String {
    let action = if action_id.is_empty() { "tap" } else { action_id };
    let id = notification_id.map(|id| id.to_string()).unwrap_or_default();
    format!("{payload}|action:{action}|id:{id}")
}

/// Signature to processed-at (epoch millis).
type Ledger = BTreeMap<String, i64>;

pub struct ReplayDetector {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ReplayDetector {
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { kv, ttl, clock }
    }

    /// Detector with the TTL from `[notifications] replay_ttl_secs`.
    pub fn from_config(
        kv: Arc<dyn KeyValueStore>,
        config: &NotificationsConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(kv, daybook_core::seconds(config.replay_ttl_secs), clock)
    }

    /// True when `signature` was processed within the TTL.
    pub async fn is_replay(&self, signature: &str) -> Result<bool, DaybookError> {
        let ledger = self.load_pruned().await?;
        Ok(ledger.contains_key(signature))
    }

    /// Record `signature` as processed now.
    pub async fn mark_processed(&self, signature: &str) -> Result<(), DaybookError> {
        let mut ledger = self.load_pruned().await?;
        ledger.insert(signature.to_string(), self.clock.now().timestamp_millis());
        self.save(&ledger).await
    }

    /// Live entries, oldest first.
    pub async fn entries(&self) -> Result<Vec<(String, DateTime<Utc>)>, DaybookError> {
        let ledger = self.load_pruned().await?;
        let mut entries: Vec<(String, DateTime<Utc>)> = ledger
            .into_iter()
            .filter_map(|(sig, at)| DateTime::from_timestamp_millis(at).map(|at| (sig, at)))
            .collect();
        entries.sort_by_key(|(_, at)| *at);
        Ok(entries)
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn prune(&self) -> Result<usize, DaybookError> {
        let ledger = self.load().await?;
        let before = ledger.len();
        let kept = self.without_expired(ledger);
        let removed = before - kept.len();
        if removed > 0 {
            self.save(&kept).await?;
        }
        Ok(removed)
    }

    /// Remove every entry.
    pub async fn clear(&self) -> Result<(), DaybookError> {
        self.kv.remove(REPLAY_LEDGER_KEY).await
    }

    async fn load(&self) -> Result<Ledger, DaybookError> {
        let Some(raw) = self.kv.get_string(REPLAY_LEDGER_KEY).await? else {
            return Ok(Ledger::new());
        };
        match serde_json::from_str(&raw) {
            Ok(ledger) => Ok(ledger),
            Err(e) => {
                warn!(error = %e, "replay ledger is corrupt, starting a new one");
                Ok(Ledger::new())
            }
        }
    }

    async fn load_pruned(&self) -> Result<Ledger, DaybookError> {
        let ledger = self.load().await?;
        let before = ledger.len();
        let kept = self.without_expired(ledger);
        if kept.len() != before {
            debug!(removed = before - kept.len(), "pruned replay ledger");
            self.save(&kept).await?;
        }
        Ok(kept)
    }

    fn without_expired(&self, ledger: Ledger) -> Ledger {
        let cutoff = (self.clock.now() - self.ttl).timestamp_millis();
        ledger.into_iter().filter(|(_, at)| *at > cutoff).collect()
    }

    async fn save(&self, ledger: &Ledger) -> Result<(), DaybookError> {
        let raw = serde_json::to_string(ledger)?;
        self.kv.set_string(REPLAY_LEDGER_KEY, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_test_utils::{ManualClock, MemoryKeyValueStore};

    fn detector() -> (ReplayDetector, Arc<ManualClock>, Arc<MemoryKeyValueStore>) {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::fixed());
        let detector = ReplayDetector::new(kv.clone(), Duration::hours(24), clock.clone());
        (detector, clock, kv)
    }

    #[test]
    fn signature_format() {
        assert_eq!(
            signature("task|t-1|reminder|5|minutes", "", Some(42)),
            "task|t-1|reminder|5|minutes|action:tap|id:42"
        );
        assert_eq!(signature("p", "snooze", None), "p|action:snooze|id:");
    }

    #[tokio::test]
    async fn marked_signature_is_a_replay() {
        let (detector, _, _) = detector();
        let sig = signature("task|t-1", "", Some(1));
        assert!(!detector.is_replay(&sig).await.unwrap());

        detector.mark_processed(&sig).await.unwrap();
        assert!(detector.is_replay(&sig).await.unwrap());
        assert!(!detector.is_replay(&signature("task|t-1", "snooze", Some(1))).await.unwrap());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let (detector, clock, kv) = detector();
        detector.mark_processed("old").await.unwrap();
        clock.advance(Duration::hours(23));
        detector.mark_processed("recent").await.unwrap();

        clock.advance(Duration::hours(2));
        assert!(!detector.is_replay("old").await.unwrap());
        assert!(detector.is_replay("recent").await.unwrap());

        let stored = kv.get_string(REPLAY_LEDGER_KEY).await.unwrap().unwrap();
        assert!(!stored.contains("old"), "pruned on read: {stored}");
    }

    #[tokio::test]
    async fn prune_reports_removed_count() {
        let (detector, clock, _) = detector();
        detector.mark_processed("a").await.unwrap();
        detector.mark_processed("b").await.unwrap();
        clock.advance(Duration::hours(25));
        detector.mark_processed("c").await.unwrap();
        // "a" and "b" were already pruned by the write above.
        assert_eq!(detector.prune().await.unwrap(), 0);

        clock.advance(Duration::hours(25));
        assert_eq!(detector.prune().await.unwrap(), 1);
        assert!(detector.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_ledger_is_reset() {
        let (detector, _, kv) = detector();
        kv.set_string(REPLAY_LEDGER_KEY, "not json").await.unwrap();
        assert!(!detector.is_replay("x").await.unwrap());
        detector.mark_processed("x").await.unwrap();
        assert_eq!(detector.entries().await.unwrap().len(), 1);
    }
}
