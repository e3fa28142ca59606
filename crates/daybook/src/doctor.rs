// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `daybook doctor` command implementation.
//!
//! Runs diagnostic checks against the configuration and the notification
//! state database.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use daybook_config::DaybookConfig;
use daybook_core::{DaybookError, KeyValueStore, SystemClock, seconds};
use daybook_notify::{DeferredInteractionStore, ReplayDetector};
use daybook_storage::database::map_tr_err;
use daybook_storage::SqliteKeyValueStore;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `daybook doctor` command.
///
/// With `plain`, disables colored output.
pub async fn run_doctor(config: &DaybookConfig, plain: bool) -> Result<(), DaybookError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_config(config),
        check_database(&config.storage.database_path).await,
        check_db_integrity(&config.storage.database_path).await,
        check_notification_state(config).await,
    ];

    println!();
    println!("  daybook doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", render_line(result, use_color));
    }

    println!();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!(
            "    {symbol} {:<20} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// The config was already loaded and validated; report what it resolved to.
fn check_config(config: &DaybookConfig) -> CheckResult {
    let start = Instant::now();
    let disabled = config.modules.disabled.len();
    CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        format!("valid ({disabled} module(s) disabled)"),
        start,
    )
}

/// Check the database file exists and answers a trivial query.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !std::path::Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first write)"),
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "Database",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };

    let query = conn
        .call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("SELECT 1")?;
            Ok(())
        })
        .await;

    match query {
        Ok(()) => CheckResult::new("Database", CheckStatus::Pass, "connected", start),
        Err(e) => CheckResult::new(
            "Database",
            CheckStatus::Fail,
            format!("query failed: {}", map_tr_err(e)),
            start,
        ),
    }
}

/// SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !std::path::Path::new(db_path).exists() {
        return CheckResult::new(
            "DB integrity",
            CheckStatus::Warn,
            "database not found (skipped)",
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "DB integrity",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };

    let rows = conn
        .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare("PRAGMA integrity_check")?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(rows)
        })
        .await;

    match rows {
        Ok(rows) if rows.len() == 1 && rows[0] == "ok" => {
            CheckResult::new("DB integrity", CheckStatus::Pass, "ok", start)
        }
        Ok(rows) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("{} issue(s) found", rows.len()),
            start,
        ),
        Err(e) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("check failed: {}", map_tr_err(e)),
            start,
        ),
    }
}

/// Report a stale deferred interaction and the replay ledger size.
async fn check_notification_state(config: &DaybookConfig) -> CheckResult {
    let start = Instant::now();
    if !std::path::Path::new(&config.storage.database_path).exists() {
        return CheckResult::new(
            "Notification state",
            CheckStatus::Warn,
            "database not found (skipped)",
            start,
        );
    }

    let store = match SqliteKeyValueStore::open(&config.storage).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            return CheckResult::new(
                "Notification state",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };
    let kv: Arc<dyn KeyValueStore> = store.clone();

    let result = summarize_state(kv, config).await;
    if let Ok(store) = Arc::try_unwrap(store)
        && let Err(e) = store.close().await
    {
        tracing::warn!(error = %e, "failed to close database after doctor check");
    }

    match result {
        Ok((status, message)) => CheckResult::new("Notification state", status, message, start),
        Err(e) => CheckResult::new(
            "Notification state",
            CheckStatus::Fail,
            format!("read failed: {e}"),
            start,
        ),
    }
}

async fn summarize_state(
    kv: Arc<dyn KeyValueStore>,
    config: &DaybookConfig,
) -> Result<(CheckStatus, String), DaybookError> {
    let pending = DeferredInteractionStore::new(kv.clone()).peek().await?;
    let replay = ReplayDetector::from_config(kv, &config.notifications, Arc::new(SystemClock))
        .entries()
        .await?;

    let max_age = seconds(config.notifications.max_deferred_age_secs);
    Ok(match pending {
        Some(p) if p.age(Utc::now()) > max_age => (
            CheckStatus::Warn,
            format!(
                "stale deferred interaction from {} ({} replay signature(s))",
                p.stored_at.to_rfc3339(),
                replay.len()
            ),
        ),
        Some(_) => (
            CheckStatus::Pass,
            format!("1 deferred interaction ({} replay signature(s))", replay.len()),
        ),
        None => (
            CheckStatus::Pass,
            format!("no deferred interaction ({} replay signature(s))", replay.len()),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_notify::DeferredInteraction;
    use daybook_test_utils::MemoryKeyValueStore;

    #[test]
    fn plain_lines_carry_status_tags() {
        let result = CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Warn,
            message: "not found".to_string(),
            duration: Duration::from_millis(5),
        };
        let line = render_line(&result, false);
        assert!(line.contains("[WARN]"));
        assert!(line.contains("not found"));
        assert!(line.ends_with("(5ms)"));
    }

    #[tokio::test]
    async fn check_database_missing_warns() {
        let result = check_database("/tmp/nonexistent-daybook-test-xyz.db").await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("not found"));
    }

    #[tokio::test]
    async fn check_db_integrity_missing_warns() {
        let result = check_db_integrity("/tmp/nonexistent-daybook-test-xyz.db").await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn fresh_database_passes_every_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DaybookConfig::default();
        config.storage.database_path = dir.path().join("daybook.db").display().to_string();

        SqliteKeyValueStore::open(&config.storage)
            .await
            .unwrap()
            .close()
            .await
            .unwrap();

        assert_eq!(
            check_database(&config.storage.database_path).await.status,
            CheckStatus::Pass
        );
        assert_eq!(
            check_db_integrity(&config.storage.database_path).await.status,
            CheckStatus::Pass
        );
        let state = check_notification_state(&config).await;
        assert_eq!(state.status, CheckStatus::Pass);
        assert!(state.message.contains("no deferred interaction"));
    }

    #[tokio::test]
    async fn stale_deferred_interaction_warns() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        DeferredInteractionStore::new(kv.clone())
            .store(&DeferredInteraction::new(
                "task|t-1",
                "",
                None,
                Utc::now() - chrono::Duration::days(2),
            ))
            .await
            .unwrap();

        let (status, message) = summarize_state(kv, &DaybookConfig::default()).await.unwrap();
        assert_eq!(status, CheckStatus::Warn);
        assert!(message.contains("stale"));
    }
}
