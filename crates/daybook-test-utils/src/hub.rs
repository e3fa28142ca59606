// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fakes for module dispatch and the universal reminder subsystem.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use daybook_core::{
    DaybookError, Module, ModuleAdapterHub, NotificationPayload, TrackedEntity,
    UniversalReminders,
};

/// Hub fake that claims payloads for a configurable set of module ids.
#[derive(Default)]
pub struct MockHub {
    claimed: Mutex<HashSet<String>>,
    failing: AtomicBool,
    taps: Mutex<Vec<String>>,
    actions: Mutex<Vec<(String, String, Option<i32>)>>,
    snoozes: Mutex<Vec<(String, Option<i32>, Option<u32>)>>,
    cancellations: Mutex<Vec<(Module, String)>>,
}

impl MockHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hub whose adapters claim the given modules.
    pub fn claiming(modules: &[&str]) -> Self {
        let hub = Self::new();
        for module in modules {
            hub.claim(module);
        }
        hub
    }

    pub fn claim(&self, module: &str) {
        self.claimed.lock().unwrap().insert(module.to_lowercase());
    }

    /// Make every call return a hub error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn taps(&self) -> Vec<String> {
        self.taps.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<(String, String, Option<i32>)> {
        self.actions.lock().unwrap().clone()
    }

    pub fn snoozes(&self) -> Vec<(String, Option<i32>, Option<u32>)> {
        self.snoozes.lock().unwrap().clone()
    }

    pub fn cancellations(&self) -> Vec<(Module, String)> {
        self.cancellations.lock().unwrap().clone()
    }

    fn claims(&self, payload: &str) -> Result<bool, DaybookError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DaybookError::hub("injected hub failure"));
        }
        Ok(NotificationPayload::parse(payload)
            .map(|p| self.claimed.lock().unwrap().contains(p.module.as_str()))
            .unwrap_or(false))
    }
}

#[async_trait]
impl ModuleAdapterHub for MockHub {
    async fn handle_tap(&self, payload: &str) -> Result<bool, DaybookError> {
        let claimed = self.claims(payload)?;
        if claimed {
            self.taps.lock().unwrap().push(payload.to_string());
        }
        Ok(claimed)
    }

    async fn handle_action(
        &self,
        action_id: &str,
        payload: &str,
        notification_id: Option<i32>,
    ) -> Result<bool, DaybookError> {
        let claimed = self.claims(payload)?;
        if claimed {
            self.actions.lock().unwrap().push((
                action_id.to_string(),
                payload.to_string(),
                notification_id,
            ));
        }
        Ok(claimed)
    }

    async fn snooze(
        &self,
        payload: &str,
        notification_id: Option<i32>,
        minutes: Option<u32>,
    ) -> Result<bool, DaybookError> {
        let claimed = self.claims(payload)?;
        if claimed {
            self.snoozes
                .lock()
                .unwrap()
                .push((payload.to_string(), notification_id, minutes));
        }
        Ok(claimed)
    }

    async fn cancel_for_entity(
        &self,
        module: &Module,
        entity_id: &str,
    ) -> Result<(), DaybookError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DaybookError::hub("injected hub failure"));
        }
        self.cancellations
            .lock()
            .unwrap()
            .push((module.clone(), entity_id.to_string()));
        Ok(())
    }
}

/// Universal reminder fake: entities listed via [`MockUniversalReminders::enable`]
/// report enabled definitions and "schedule" one reminder each.
#[derive(Default)]
pub struct MockUniversalReminders {
    enabled: Mutex<HashSet<(String, String)>>,
    scheduled: Mutex<Vec<String>>,
    purged: Mutex<Vec<(Module, String)>>,
}

impl MockUniversalReminders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self, module: &Module, entity_id: &str) {
        self.enabled
            .lock()
            .unwrap()
            .insert((module.as_str().to_string(), entity_id.to_string()));
    }

    /// Entity ids handed to `schedule()`.
    pub fn scheduled(&self) -> Vec<String> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn purged(&self) -> Vec<(Module, String)> {
        self.purged.lock().unwrap().clone()
    }
}

#[async_trait]
impl UniversalReminders for MockUniversalReminders {
    async fn has_enabled(&self, module: &Module, entity_id: &str) -> Result<bool, DaybookError> {
        Ok(self
            .enabled
            .lock()
            .unwrap()
            .contains(&(module.as_str().to_string(), entity_id.to_string())))
    }

    async fn schedule(&self, entity: &TrackedEntity) -> Result<usize, DaybookError> {
        self.scheduled.lock().unwrap().push(entity.id.clone());
        Ok(1)
    }

    async fn purge(&self, module: &Module, entity_id: &str) -> Result<(), DaybookError> {
        self.enabled
            .lock()
            .unwrap()
            .remove(&(module.as_str().to_string(), entity_id.to_string()));
        self.purged
            .lock()
            .unwrap()
            .push((module.clone(), entity_id.to_string()));
        Ok(())
    }
}
