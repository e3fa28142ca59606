// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of per-module notification handlers.
//!
//! Modules other than task and habit (mood, sleep, finance, ...) register a
//! [`ModuleAdapter`]. [`AdapterHub`] parses each payload and forwards it to the
//! adapter registered for the payload's module id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use daybook_core::{DaybookError, Module, ModuleAdapterHub, NotificationPayload};
use tracing::{debug, info};

/// Notification handling for one module.
#[async_trait]
pub trait ModuleAdapter: Send + Sync + 'static {
    /// Module id this adapter claims, e.g. `mood`.
    fn module_id(&self) -> &str;

    async fn handle_tap(&self, payload: &NotificationPayload) -> Result<bool, DaybookError>;

    async fn handle_action(
        &self,
        action_id: &str,
        payload: &NotificationPayload,
        notification_id: Option<i32>,
    ) -> Result<bool, DaybookError>;

    /// Modules without snooze support leave this unclaimed.
    async fn snooze(
        &self,
        _payload: &NotificationPayload,
        _notification_id: Option<i32>,
        _minutes: Option<u32>,
    ) -> Result<bool, DaybookError> {
        Ok(false)
    }

    async fn cancel_for_entity(&self, _entity_id: &str) -> Result<(), DaybookError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct AdapterHub {
    adapters: HashMap<String, Arc<dyn ModuleAdapter>>,
}

impl AdapterHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any previous one for the same module.
    pub fn register(&mut self, adapter: Arc<dyn ModuleAdapter>) {
        let module = adapter.module_id().to_lowercase();
        info!(module = %module, "registered notification adapter");
        self.adapters.insert(module, adapter);
    }

    pub fn get(&self, module: &Module) -> Option<&Arc<dyn ModuleAdapter>> {
        self.adapters.get(module.as_str())
    }

    pub fn modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        modules.sort_unstable();
        modules
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Parse `raw` and find the adapter for its module.
    fn route(&self, raw: &str) -> Option<(&Arc<dyn ModuleAdapter>, NotificationPayload)> {
        let payload = match NotificationPayload::parse(raw) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(error = %e, "hub ignoring unparseable payload");
                return None;
            }
        };
        let adapter = self.get(&payload.module)?;
        Some((adapter, payload))
    }
}

#[async_trait]
impl ModuleAdapterHub for AdapterHub {
    async fn handle_tap(&self, payload: &str) -> Result<bool, DaybookError> {
        match self.route(payload) {
            Some((adapter, parsed)) => adapter.handle_tap(&parsed).await,
            None => Ok(false),
        }
    }

    async fn handle_action(
        &self,
        action_id: &str,
        payload: &str,
        notification_id: Option<i32>,
    ) -> Result<bool, DaybookError> {
        match self.route(payload) {
            Some((adapter, parsed)) => {
                adapter
                    .handle_action(action_id, &parsed, notification_id)
                    .await
            }
            None => Ok(false),
        }
    }

    async fn snooze(
        &self,
        payload: &str,
        notification_id: Option<i32>,
        minutes: Option<u32>,
    ) -> Result<bool, DaybookError> {
        match self.route(payload) {
            Some((adapter, parsed)) => adapter.snooze(&parsed, notification_id, minutes).await,
            None => Ok(false),
        }
    }

    async fn cancel_for_entity(
        &self,
        module: &Module,
        entity_id: &str,
    ) -> Result<(), DaybookError> {
        match self.get(module) {
            Some(adapter) => adapter.cancel_for_entity(entity_id).await,
            None => Ok(()),
        }
    }
}
