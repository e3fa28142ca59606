// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Daybook.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Daybook configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaybookConfig {
    /// Application identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Durable key-value storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Deferred-interaction and replay settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Snooze defaults for tasks and habits.
    #[serde(default)]
    pub snooze: SnoozeConfig,

    /// Per-module enablement.
    #[serde(default)]
    pub modules: ModulesConfig,

    /// Metrics recording.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Application identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "daybook".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("daybook").join("daybook.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "daybook.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// What the router assumes when the lock-state query itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LockQueryFailure {
    /// Treat the device as locked and defer the interaction.
    #[default]
    Defer,
    /// Treat the device as unlocked and handle the interaction now.
    Proceed,
}

/// Deferred-interaction and replay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Deferred interactions older than this are discarded on resume.
    #[serde(default = "default_max_deferred_age_secs")]
    pub max_deferred_age_secs: u64,

    /// How long a processed interaction signature blocks reprocessing.
    #[serde(default = "default_replay_ttl_secs")]
    pub replay_ttl_secs: u64,

    #[serde(default)]
    pub lock_query_failure: LockQueryFailure,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            max_deferred_age_secs: default_max_deferred_age_secs(),
            replay_ttl_secs: default_replay_ttl_secs(),
            lock_query_failure: LockQueryFailure::default(),
        }
    }
}

fn default_max_deferred_age_secs() -> u64 {
    6 * 60 * 60
}

fn default_replay_ttl_secs() -> u64 {
    24 * 60 * 60
}

/// Snooze defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SnoozeConfig {
    #[serde(default = "default_snooze_minutes")]
    pub task_default_minutes: u32,

    #[serde(default = "default_snooze_minutes")]
    pub habit_default_minutes: u32,

    /// Upper bound for any snooze, including `snooze_<minutes>` overrides.
    #[serde(default = "default_max_snooze_minutes")]
    pub max_minutes: u32,
}

impl Default for SnoozeConfig {
    fn default() -> Self {
        Self {
            task_default_minutes: default_snooze_minutes(),
            habit_default_minutes: default_snooze_minutes(),
            max_minutes: default_max_snooze_minutes(),
        }
    }
}

fn default_snooze_minutes() -> u32 {
    10
}

fn default_max_snooze_minutes() -> u32 {
    24 * 60
}

/// Per-module enablement configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModulesConfig {
    /// Module ids whose notifications are ignored.
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder at startup.
    #[serde(default)]
    pub enabled: bool,
}
