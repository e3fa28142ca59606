// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module enablement, snooze settings, and lock-state implementations backed
//! by configuration and the key-value store.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use daybook_config::model::{ModulesConfig, SnoozeConfig};
use daybook_core::{
    DaybookError, EntityKind, KeyValueStore, LockStateOracle, Module, ModulePolicy,
    SnoozeSettings, SnoozeSettingsProvider,
};

/// Modules are enabled unless listed in `[modules] disabled`.
#[derive(Debug, Clone, Default)]
pub struct ConfigModulePolicy {
    disabled: HashSet<String>,
}

impl ConfigModulePolicy {
    pub fn new(config: &ModulesConfig) -> Self {
        Self {
            disabled: config.disabled.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    pub fn allows(&self, module: &Module) -> bool {
        !self.disabled.contains(module.as_str())
    }
}

#[async_trait]
impl ModulePolicy for ConfigModulePolicy {
    async fn is_enabled(&self, module: &Module) -> Result<bool, DaybookError> {
        Ok(self.allows(module))
    }
}

/// Prefix of the per-module override keys, e.g. `module_enabled.habit`.
pub const MODULE_ENABLED_PREFIX: &str = "module_enabled.";

pub fn module_enabled_key(module: &Module) -> String {
    format!("{MODULE_ENABLED_PREFIX}{module}")
}

/// Per-module switches toggled at runtime and stored in the key-value store,
/// falling back to configuration when a module has no stored switch.
pub struct StoredModulePolicy {
    kv: Arc<dyn KeyValueStore>,
    fallback: ConfigModulePolicy,
}

impl StoredModulePolicy {
    pub fn new(kv: Arc<dyn KeyValueStore>, fallback: ConfigModulePolicy) -> Self {
        Self { kv, fallback }
    }

    pub async fn set_enabled(&self, module: &Module, enabled: bool) -> Result<(), DaybookError> {
        self.kv.set_bool(&module_enabled_key(module), enabled).await
    }
}

#[async_trait]
impl ModulePolicy for StoredModulePolicy {
    async fn is_enabled(&self, module: &Module) -> Result<bool, DaybookError> {
        Ok(self
            .kv
            .get_bool(&module_enabled_key(module))
            .await?
            .unwrap_or_else(|| self.fallback.allows(module)))
    }
}

/// Snooze defaults from the `[snooze]` section.
#[derive(Debug, Clone)]
pub struct ConfigSnoozeSettings {
    config: SnoozeConfig,
}

impl ConfigSnoozeSettings {
    pub fn new(config: SnoozeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SnoozeSettingsProvider for ConfigSnoozeSettings {
    async fn snooze_settings(&self, kind: EntityKind) -> Result<SnoozeSettings, DaybookError> {
        let default_minutes = match kind {
            EntityKind::Task => self.config.task_default_minutes,
            EntityKind::Habit => self.config.habit_default_minutes,
        };
        Ok(SnoozeSettings {
            default_minutes,
            max_minutes: self.config.max_minutes,
        })
    }
}

/// Lock oracle for hosts without a keyguard: the device is never locked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverLocked;

#[async_trait]
impl LockStateOracle for NeverLocked {
    async fn is_locked(&self) -> Result<bool, DaybookError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_test_utils::MemoryKeyValueStore;

    #[tokio::test]
    async fn config_disables_listed_modules() {
        let policy = ConfigModulePolicy::new(&ModulesConfig {
            disabled: vec!["Habit".into(), "mood".into()],
        });
        assert!(policy.is_enabled(&Module::Task).await.unwrap());
        assert!(!policy.is_enabled(&Module::Habit).await.unwrap());
        assert!(!policy.is_enabled(&Module::from("mood")).await.unwrap());
    }

    #[tokio::test]
    async fn stored_switch_overrides_config() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let policy = StoredModulePolicy::new(
            kv.clone(),
            ConfigModulePolicy::new(&ModulesConfig {
                disabled: vec!["habit".into()],
            }),
        );
        assert!(!policy.is_enabled(&Module::Habit).await.unwrap());

        policy.set_enabled(&Module::Habit, true).await.unwrap();
        policy.set_enabled(&Module::Task, false).await.unwrap();
        assert!(policy.is_enabled(&Module::Habit).await.unwrap());
        assert!(!policy.is_enabled(&Module::Task).await.unwrap());
        assert!(kv.contains("module_enabled.task"));
    }

    #[tokio::test]
    async fn snooze_settings_per_kind() {
        let settings = ConfigSnoozeSettings::new(SnoozeConfig {
            task_default_minutes: 10,
            habit_default_minutes: 30,
            max_minutes: 120,
        });
        let habit = settings.snooze_settings(EntityKind::Habit).await.unwrap();
        assert_eq!(habit.default_minutes, 30);
        assert_eq!(habit.max_minutes, 120);
    }
}
