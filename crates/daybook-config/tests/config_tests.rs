// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Daybook configuration system.

use daybook_config::diagnostic::ConfigError;
use daybook_config::model::{DaybookConfig, LockQueryFailure};
use daybook_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_daybook_config() {
    let toml = r#"
[app]
name = "daybook-test"
log_level = "debug"

[storage]
database_path = "/tmp/daybook-test.db"
wal_mode = false

[notifications]
max_deferred_age_secs = 3600
replay_ttl_secs = 7200
lock_query_failure = "proceed"

[snooze]
task_default_minutes = 5
habit_default_minutes = 20
max_minutes = 120

[modules]
disabled = ["finance", "sleep"]

[metrics]
enabled = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.name, "daybook-test");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/daybook-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.notifications.max_deferred_age_secs, 3600);
    assert_eq!(config.notifications.replay_ttl_secs, 7200);
    assert_eq!(
        config.notifications.lock_query_failure,
        LockQueryFailure::Proceed
    );
    assert_eq!(config.snooze.task_default_minutes, 5);
    assert_eq!(config.snooze.habit_default_minutes, 20);
    assert_eq!(config.snooze.max_minutes, 120);
    assert_eq!(config.modules.disabled, vec!["finance", "sleep"]);
    assert!(config.metrics.enabled);
}

/// Missing sections fall back to the documented defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.app.name, "daybook");
    assert_eq!(config.app.log_level, "info");
    assert!(config.storage.wal_mode);
    assert_eq!(config.notifications.max_deferred_age_secs, 6 * 60 * 60);
    assert_eq!(config.notifications.replay_ttl_secs, 24 * 60 * 60);
    assert_eq!(
        config.notifications.lock_query_failure,
        LockQueryFailure::Defer
    );
    assert_eq!(config.snooze.task_default_minutes, 10);
    assert_eq!(config.snooze.habit_default_minutes, 10);
    assert!(config.modules.disabled.is_empty());
    assert!(!config.metrics.enabled);
}

/// A misspelled key is rejected with a suggestion.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[notifications]
replay_tll_secs = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "replay_tll_secs");
            assert_eq!(suggestion.as_deref(), Some("replay_ttl_secs"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Wrong value types are reported as InvalidType.
#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[snooze]
task_default_minutes = "ten"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject string minutes");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "expected InvalidType, got {errors:?}"
    );
}

/// Unknown lock-failure modes are rejected at deserialization.
#[test]
fn unknown_lock_failure_mode_is_rejected() {
    let toml = r#"
[notifications]
lock_query_failure = "ignore"
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[notifications]
replay_ttl_secs = 0

[snooze]
task_default_minutes = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2, "got {errors:?}");
}

/// Environment variables override TOML values.
#[test]
#[serial_test::serial]
fn env_var_overrides_replay_ttl() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("daybook.toml", "[notifications]\nreplay_ttl_secs = 120\n")?;
        jail.set_env("DAYBOOK_NOTIFICATIONS_REPLAY_TTL_SECS", "60");
        let config = load_config_from_path(std::path::Path::new("daybook.toml"))?;
        assert_eq!(config.notifications.replay_ttl_secs, 60);
        Ok(())
    });
}
