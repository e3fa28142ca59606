// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end notification flows.
//!
//! `TestHarness` wires a router, coordinator, and snooze persister to the
//! fakes in this crate. The key-value store is in memory by default, or a
//! temp SQLite database via [`TestHarnessBuilder::with_sqlite_store`].

use std::sync::Arc;

use daybook_config::model::{
    LockQueryFailure, ModulesConfig, NotificationsConfig, SnoozeConfig, StorageConfig,
};
use daybook_core::{DaybookError, KeyValueStore, TrackedEntity};
use daybook_notify::{
    AlarmLedger, ConfigModulePolicy, ConfigSnoozeSettings, DeferredInteractionStore,
    EntityLockManager, EntityRepositories, NotificationActionRouter, ReminderCoordinator,
    ReplayDetector, RouterSettings, SnoozeStatePersister,
};
use daybook_storage::SqliteKeyValueStore;

use crate::hub::{MockHub, MockUniversalReminders};
use crate::kv::MemoryKeyValueStore;
use crate::platform::{ManualClock, MockLockOracle};
use crate::repository::InMemoryEntityRepository;
use crate::scheduler::RecordingScheduler;
use crate::sinks::{RecordingActivityLog, RecordingPresenter};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    notifications: NotificationsConfig,
    snooze: SnoozeConfig,
    disabled_modules: Vec<String>,
    hub_modules: Vec<String>,
    locked: bool,
    sqlite: bool,
    entities: Vec<TrackedEntity>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            notifications: NotificationsConfig::default(),
            snooze: SnoozeConfig::default(),
            disabled_modules: Vec::new(),
            hub_modules: Vec::new(),
            locked: false,
            sqlite: false,
            entities: Vec::new(),
        }
    }

    /// Disable notifications for a module id.
    pub fn with_disabled_module(mut self, module: &str) -> Self {
        self.disabled_modules.push(module.to_string());
        self
    }

    /// Have the mock hub claim a module id.
    pub fn with_hub_module(mut self, module: &str) -> Self {
        self.hub_modules.push(module.to_string());
        self
    }

    /// Start with the device locked.
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn with_lock_query_failure(mut self, policy: LockQueryFailure) -> Self {
        self.notifications.lock_query_failure = policy;
        self
    }

    pub fn with_snooze(mut self, snooze: SnoozeConfig) -> Self {
        self.snooze = snooze;
        self
    }

    /// Seed a task or habit into the matching repository.
    pub fn with_entity(mut self, entity: TrackedEntity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Back the key-value store with SQLite in a temp directory.
    pub fn with_sqlite_store(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, DaybookError> {
        let (kv, memory_kv, temp_dir) = if self.sqlite {
            let temp_dir = tempfile::TempDir::new().map_err(DaybookError::storage)?;
            let config = StorageConfig {
                database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
                wal_mode: true,
            };
            let store = SqliteKeyValueStore::open(&config).await?;
            let kv: Arc<dyn KeyValueStore> = Arc::new(store);
            (kv, None, Some(temp_dir))
        } else {
            let store = Arc::new(MemoryKeyValueStore::new());
            let kv: Arc<dyn KeyValueStore> = store.clone();
            (kv, Some(store), None)
        };

        let clock = Arc::new(ManualClock::fixed());
        let oracle = Arc::new(MockLockOracle::new(self.locked));
        let tasks = Arc::new(InMemoryEntityRepository::new());
        let habits = Arc::new(InMemoryEntityRepository::new());
        for entity in self.entities {
            match entity.kind {
                daybook_core::EntityKind::Task => tasks.insert(entity),
                daybook_core::EntityKind::Habit => habits.insert(entity),
            }
        }
        let scheduler = Arc::new(RecordingScheduler::new());
        let hub = Arc::new(MockHub::new());
        for module in &self.hub_modules {
            hub.claim(module);
        }
        let universal = Arc::new(MockUniversalReminders::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let activity = Arc::new(RecordingActivityLog::new());

        let policy = Arc::new(ConfigModulePolicy::new(&ModulesConfig {
            disabled: self.disabled_modules,
        }));
        let locks = Arc::new(EntityLockManager::new());
        let repos = EntityRepositories::new(tasks.clone(), habits.clone());

        let snooze = Arc::new(SnoozeStatePersister::new(
            locks.clone(),
            repos.clone(),
            Arc::new(ConfigSnoozeSettings::new(self.snooze)),
            scheduler.clone(),
            activity.clone(),
            clock.clone(),
        ));
        let coordinator = ReminderCoordinator::new(
            locks.clone(),
            policy.clone(),
            universal.clone(),
            scheduler.clone(),
            hub.clone(),
            AlarmLedger::new(kv.clone()),
            clock.clone(),
        );
        let router = NotificationActionRouter::new(
            oracle.clone(),
            DeferredInteractionStore::new(kv.clone()),
            ReplayDetector::from_config(kv.clone(), &self.notifications, clock.clone()),
            policy,
            repos,
            scheduler.clone(),
            AlarmLedger::new(kv.clone()),
            hub.clone(),
            snooze.clone(),
            presenter.clone(),
            clock.clone(),
            RouterSettings::from_config(&self.notifications),
        );

        Ok(TestHarness {
            router,
            coordinator,
            snooze,
            locks,
            kv,
            memory_kv,
            oracle,
            tasks,
            habits,
            scheduler,
            hub,
            universal,
            presenter,
            activity,
            clock,
            notifications: self.notifications,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete notification stack over fakes.
pub struct TestHarness {
    pub router: NotificationActionRouter,
    pub coordinator: ReminderCoordinator,
    pub snooze: Arc<SnoozeStatePersister>,
    pub locks: Arc<EntityLockManager>,
    /// The store behind the deferred slot, replay ledger, and alarm ledger.
    pub kv: Arc<dyn KeyValueStore>,
    /// Set when the store is in memory, for out-of-band writes.
    pub memory_kv: Option<Arc<MemoryKeyValueStore>>,
    pub oracle: Arc<MockLockOracle>,
    pub tasks: Arc<InMemoryEntityRepository>,
    pub habits: Arc<InMemoryEntityRepository>,
    pub scheduler: Arc<RecordingScheduler>,
    pub hub: Arc<MockHub>,
    pub universal: Arc<MockUniversalReminders>,
    pub presenter: Arc<RecordingPresenter>,
    pub activity: Arc<RecordingActivityLog>,
    pub clock: Arc<ManualClock>,
    pub notifications: NotificationsConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A view of the deferred slot over the harness store.
    pub fn deferred(&self) -> DeferredInteractionStore {
        DeferredInteractionStore::new(self.kv.clone())
    }

    /// A view of the replay ledger over the harness store.
    pub fn replay(&self) -> ReplayDetector {
        ReplayDetector::from_config(self.kv.clone(), &self.notifications, self.clock.clone())
    }

    pub fn alarms(&self) -> AlarmLedger {
        AlarmLedger::new(self.kv.clone())
    }
}
