// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commands that read or edit the durable notification state.
//!
//! Each command renders its output to a `String` so the same code runs
//! against SQLite from the binary and against the in-memory store in tests.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use daybook_config::DaybookConfig;
use daybook_core::{Clock, DaybookError, KeyValueStore, Module, ModulePolicy, seconds};
use daybook_notify::policy::MODULE_ENABLED_PREFIX;
use daybook_notify::{
    parse_reminder_spec, AlarmLedger, ConfigModulePolicy, DeferredInteractionStore,
    ReplayDetector, StoredModulePolicy,
};
use daybook_storage::SqliteKeyValueStore;

/// Open the configured store, run `command` against it, close it, and print
/// the rendered output.
pub async fn with_store<F, Fut>(config: &DaybookConfig, command: F) -> Result<(), DaybookError>
where
    F: FnOnce(Arc<dyn KeyValueStore>, Vec<String>) -> Fut,
    Fut: Future<Output = Result<String, DaybookError>>,
{
    let store = Arc::new(SqliteKeyValueStore::open(&config.storage).await?);
    let keys = store.snapshot().await.into_iter().map(|(k, _)| k).collect();

    let kv: Arc<dyn KeyValueStore> = store.clone();
    let output = command(kv, keys).await;

    if let Ok(store) = Arc::try_unwrap(store) {
        store.close().await?;
    }

    print!("{}", output?);
    Ok(())
}

pub fn render_reminders(text: &str) -> String {
    let reminders = parse_reminder_spec(text);
    if reminders.is_empty() {
        return "no reminders\n".to_string();
    }
    reminders
        .iter()
        .map(|r| format!("{:>5} min  {}\n", r.offset_minutes, r.label))
        .collect()
}

pub async fn deferred_show(
    kv: Arc<dyn KeyValueStore>,
    config: &DaybookConfig,
    now: DateTime<Utc>,
) -> Result<String, DaybookError> {
    let Some(pending) = DeferredInteractionStore::new(kv).peek().await? else {
        return Ok("no deferred interaction\n".to_string());
    };

    let age = pending.age(now);
    let stale = age > seconds(config.notifications.max_deferred_age_secs);
    let action = if pending.is_tap() {
        "tap".to_string()
    } else {
        pending.action_id.clone()
    };
    let id = pending
        .notification_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    Ok(format!(
        "payload:         {}\naction:          {action}\nnotification id: {id}\nstored at:       {}\nage:             {}m{}\n",
        pending.payload,
        pending.stored_at.to_rfc3339(),
        age.num_minutes(),
        if stale { " (stale, will be discarded)" } else { "" },
    ))
}

pub async fn deferred_clear(kv: Arc<dyn KeyValueStore>) -> Result<String, DaybookError> {
    let store = DeferredInteractionStore::new(kv);
    if store.peek().await?.is_none() {
        return Ok("nothing pending\n".to_string());
    }
    store.clear().await?;
    Ok("deferred interaction cleared\n".to_string())
}

pub async fn replay_list(
    kv: Arc<dyn KeyValueStore>,
    config: &DaybookConfig,
    clock: Arc<dyn Clock>,
) -> Result<String, DaybookError> {
    let entries = ReplayDetector::from_config(kv, &config.notifications, clock)
        .entries()
        .await?;
    if entries.is_empty() {
        return Ok("replay ledger is empty\n".to_string());
    }
    Ok(entries
        .iter()
        .map(|(signature, at)| format!("{}  {signature}\n", at.to_rfc3339()))
        .collect())
}

pub async fn replay_prune(
    kv: Arc<dyn KeyValueStore>,
    config: &DaybookConfig,
    clock: Arc<dyn Clock>,
) -> Result<String, DaybookError> {
    let removed = ReplayDetector::from_config(kv, &config.notifications, clock)
        .prune()
        .await?;
    Ok(format!("pruned {removed} expired signature(s)\n"))
}

pub async fn replay_clear(
    kv: Arc<dyn KeyValueStore>,
    config: &DaybookConfig,
    clock: Arc<dyn Clock>,
) -> Result<String, DaybookError> {
    ReplayDetector::from_config(kv, &config.notifications, clock)
        .clear()
        .await?;
    Ok("replay ledger cleared\n".to_string())
}

pub async fn alarms_list(kv: Arc<dyn KeyValueStore>) -> Result<String, DaybookError> {
    let entries = AlarmLedger::new(kv).entries().await?;
    if entries.is_empty() {
        return Ok("no alarms recorded\n".to_string());
    }
    Ok(entries
        .iter()
        .map(|e| format!("{:>11}  {}  {}\n", e.id, e.at.to_rfc3339(), e.payload))
        .collect())
}

pub async fn modules_list(
    kv: Arc<dyn KeyValueStore>,
    keys: &[String],
    config: &DaybookConfig,
) -> Result<String, DaybookError> {
    let overridden: BTreeSet<String> = keys
        .iter()
        .filter_map(|k| k.strip_prefix(MODULE_ENABLED_PREFIX))
        .map(str::to_string)
        .collect();

    let mut known: BTreeSet<String> = ["task", "habit"].map(String::from).into();
    known.extend(config.modules.disabled.iter().map(|m| m.to_lowercase()));
    known.extend(overridden.iter().cloned());

    let policy = StoredModulePolicy::new(kv, ConfigModulePolicy::new(&config.modules));
    let mut out = String::new();
    for id in &known {
        let enabled = policy.is_enabled(&Module::from(id.as_str())).await?;
        let source = if overridden.contains(id) {
            "override"
        } else {
            "config"
        };
        out.push_str(&format!(
            "{id:<12} {:<8} ({source})\n",
            if enabled { "enabled" } else { "disabled" }
        ));
    }
    Ok(out)
}

pub async fn modules_set(
    kv: Arc<dyn KeyValueStore>,
    config: &DaybookConfig,
    module: &str,
    enabled: bool,
) -> Result<String, DaybookError> {
    let id = module.trim();
    if id.is_empty() || id.contains(['|', ',']) {
        return Err(DaybookError::Config(format!("invalid module id `{module}`")));
    }

    let module = Module::from(id);
    StoredModulePolicy::new(kv, ConfigModulePolicy::new(&config.modules))
        .set_enabled(&module, enabled)
        .await?;
    tracing::info!(module = %module, enabled, "module switch stored");

    Ok(format!(
        "{module}: {}\n",
        if enabled { "enabled" } else { "disabled" }
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use daybook_notify::{AlarmEntry, DeferredInteraction};
    use daybook_test_utils::{ManualClock, MemoryKeyValueStore};

    fn memory() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryKeyValueStore::new())
    }

    #[test]
    fn renders_each_reminder_offset() {
        let out = render_reminders(r#"[{"offsetMinutes": 30}, {"offsetMinutes": 0}]"#);
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("30 min"));
        assert!(out.contains("0 min"));

        assert_eq!(render_reminders("no reminder"), "no reminders\n");
    }

    #[tokio::test]
    async fn deferred_show_flags_stale_slot() {
        let kv = memory();
        let clock = ManualClock::fixed();
        let store = DeferredInteractionStore::new(kv.clone());
        store
            .store(&DeferredInteraction::new(
                "task|t-1|reminder|5|minutes",
                "",
                Some(42),
                clock.now(),
            ))
            .await
            .unwrap();

        let config = DaybookConfig::default();
        let fresh = deferred_show(kv.clone(), &config, clock.now() + Duration::minutes(3))
            .await
            .unwrap();
        assert!(fresh.contains("action:          tap"));
        assert!(fresh.contains("notification id: 42"));
        assert!(!fresh.contains("stale"));

        let old = deferred_show(kv.clone(), &config, clock.now() + Duration::hours(7))
            .await
            .unwrap();
        assert!(old.contains("stale"));
    }

    #[tokio::test]
    async fn deferred_clear_reports_empty_slot() {
        let kv = memory();
        assert_eq!(deferred_clear(kv.clone()).await.unwrap(), "nothing pending\n");

        DeferredInteractionStore::new(kv.clone())
            .store(&DeferredInteraction::new("habit|h-1", "snooze", None, Utc::now()))
            .await
            .unwrap();
        assert_eq!(
            deferred_clear(kv.clone()).await.unwrap(),
            "deferred interaction cleared\n"
        );
        assert!(DeferredInteractionStore::new(kv).peek().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replay_prune_drops_expired_signatures() {
        let kv = memory();
        let clock = Arc::new(ManualClock::fixed());
        let config = DaybookConfig::default();

        let detector = ReplayDetector::from_config(kv.clone(), &config.notifications, clock.clone());
        detector.mark_processed("old").await.unwrap();
        clock.advance(Duration::hours(23));
        detector.mark_processed("new").await.unwrap();
        clock.advance(Duration::hours(2));

        let pruned = replay_prune(kv.clone(), &config, clock.clone()).await.unwrap();
        assert_eq!(pruned, "pruned 1 expired signature(s)\n");

        let listed = replay_list(kv.clone(), &config, clock.clone()).await.unwrap();
        assert!(listed.contains("new"));
        assert!(!listed.contains("old"));

        replay_clear(kv.clone(), &config, clock.clone()).await.unwrap();
        assert_eq!(
            replay_list(kv, &config, clock).await.unwrap(),
            "replay ledger is empty\n"
        );
    }

    #[tokio::test]
    async fn alarms_list_shows_recorded_entries() {
        let kv = memory();
        assert_eq!(alarms_list(kv.clone()).await.unwrap(), "no alarms recorded\n");

        AlarmLedger::new(kv.clone())
            .record(AlarmEntry {
                id: 7,
                payload: "task|t-9|reminder|15|minutes".into(),
                at: Utc::now(),
            })
            .await
            .unwrap();
        let out = alarms_list(kv).await.unwrap();
        assert!(out.contains("task|t-9|reminder|15|minutes"));
        assert!(out.trim_start().starts_with('7'));
    }

    #[tokio::test]
    async fn module_switch_overrides_config() {
        let kv = memory();
        let mut config = DaybookConfig::default();
        config.modules.disabled = vec!["Mood".into()];

        let before = modules_list(kv.clone(), &[], &config).await.unwrap();
        assert!(before.contains("mood"));
        assert!(before.lines().any(|l| l.starts_with("mood") && l.contains("disabled")));

        modules_set(kv.clone(), &config, "habit", false).await.unwrap();
        let keys = vec!["module_enabled.habit".to_string()];
        let after = modules_list(kv, &keys, &config).await.unwrap();
        let habit = after.lines().find(|l| l.starts_with("habit")).unwrap();
        assert!(habit.contains("disabled"));
        assert!(habit.contains("(override)"));
        let task = after.lines().find(|l| l.starts_with("task")).unwrap();
        assert!(!task.contains("disabled"));
        assert!(task.contains("(config)"));
    }

    #[tokio::test]
    async fn module_ids_with_separators_are_rejected() {
        let config = DaybookConfig::default();
        assert!(modules_set(memory(), &config, "a|b", true).await.is_err());
        assert!(modules_set(memory(), &config, "  ", true).await.is_err());
    }
}
