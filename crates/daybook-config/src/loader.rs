// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./daybook.toml` > `~/.config/daybook/daybook.toml` > `/etc/daybook/daybook.toml`
//! with environment variable overrides via `DAYBOOK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DaybookConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/daybook/daybook.toml`
/// 3. `~/.config/daybook/daybook.toml`
/// 4. `./daybook.toml`
/// 5. `DAYBOOK_*` environment variables
pub fn load_config() -> Result<DaybookConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<DaybookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DaybookConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DaybookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DaybookConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DaybookConfig::default()))
        .merge(Toml::file("/etc/daybook/daybook.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("daybook/daybook.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("daybook.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `DAYBOOK_NOTIFICATIONS_REPLAY_TTL_SECS` must map to
/// `notifications.replay_ttl_secs`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("DAYBOOK_").map(|key| {
        let mapped = map_env_key(key.as_str());
        mapped.into()
    })
}

/// Map a prefix-stripped env var name onto a dotted config path.
///
/// Figment hands keys over in their original case.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 6] = ["app", "storage", "notifications", "snooze", "modules", "metrics"];
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_on_section_boundary_only() {
        assert_eq!(
            map_env_key("notifications_replay_ttl_secs"),
            "notifications.replay_ttl_secs"
        );
        assert_eq!(
            map_env_key("snooze_task_default_minutes"),
            "snooze.task_default_minutes"
        );
        assert_eq!(map_env_key("app_log_level"), "app.log_level");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_keys_map_in_original_case() {
        assert_eq!(
            map_env_key("NOTIFICATIONS_REPLAY_TTL_SECS"),
            "notifications.replay_ttl_secs"
        );
        assert_eq!(map_env_key("Storage_Wal_Mode"), "storage.wal_mode");
    }

    #[test]
    fn env_provider_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DAYBOOK_NOTIFICATIONS_REPLAY_TTL_SECS", "60");
            jail.set_env("DAYBOOK_APP_LOG_LEVEL", "debug");
            let config: DaybookConfig = Figment::new()
                .merge(Serialized::defaults(DaybookConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.notifications.replay_ttl_secs, 60);
            assert_eq!(config.app.log_level, "debug");
            Ok(())
        });
    }
}
