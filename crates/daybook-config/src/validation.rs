// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as positive durations, bounded snooze defaults, and payload-safe module ids.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::DaybookConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DaybookConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level `{}` must be one of {}",
                config.app.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.notifications.max_deferred_age_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "notifications.max_deferred_age_secs must be greater than 0".to_string(),
        });
    }

    if config.notifications.replay_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "notifications.replay_ttl_secs must be greater than 0".to_string(),
        });
    }

    let snooze = &config.snooze;
    if snooze.max_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "snooze.max_minutes must be greater than 0".to_string(),
        });
    }
    for (key, minutes) in [
        ("task_default_minutes", snooze.task_default_minutes),
        ("habit_default_minutes", snooze.habit_default_minutes),
    ] {
        if minutes == 0 || minutes > snooze.max_minutes {
            errors.push(ConfigError::Validation {
                message: format!(
                    "snooze.{key} must be between 1 and {}, got {minutes}",
                    snooze.max_minutes
                ),
            });
        }
    }

    let mut seen = HashSet::new();
    for (i, module) in config.modules.disabled.iter().enumerate() {
        let module = module.trim();
        if module.is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("modules.disabled[{i}] must not be empty"),
            });
            continue;
        }
        if module.contains('|') || module.contains(',') {
            errors.push(ConfigError::Validation {
                message: format!(
                    "modules.disabled[{i}] `{module}` must not contain `|` or `,`"
                ),
            });
        }
        if !seen.insert(module.to_ascii_lowercase()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate module `{module}` in modules.disabled"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = DaybookConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = DaybookConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn zero_durations_fail_validation() {
        let mut config = DaybookConfig::default();
        config.notifications.max_deferred_age_secs = 0;
        config.notifications.replay_ttl_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_error(&errors, "max_deferred_age_secs"));
        assert!(has_error(&errors, "replay_ttl_secs"));
    }

    #[test]
    fn snooze_default_above_max_fails_validation() {
        let mut config = DaybookConfig::default();
        config.snooze.max_minutes = 30;
        config.snooze.habit_default_minutes = 45;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "snooze.habit_default_minutes"));
    }

    #[test]
    fn module_ids_with_separators_fail_validation() {
        let mut config = DaybookConfig::default();
        config.modules.disabled = vec!["fin|ance".into(), "sleep".into(), "Sleep".into(), " ".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "must not contain"));
        assert!(has_error(&errors, "duplicate module"));
        assert!(has_error(&errors, "must not be empty"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = DaybookConfig::default();
        config.app.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "app.log_level"));
    }
}
