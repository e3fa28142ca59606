// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Captured side effects: tap presentation and the activity log.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use daybook_core::{
    ActivityEvent, ActivityLog, DaybookError, InteractionPresenter, NotificationPayload,
    TrackedEntity,
};

#[derive(Default)]
pub struct RecordingPresenter {
    presented: Mutex<Vec<(String, NotificationPayload)>>,
    failing: AtomicBool,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Entity ids presented so far, in order.
    pub fn presented_ids(&self) -> Vec<String> {
        self.presented
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn presented(&self) -> Vec<(String, NotificationPayload)> {
        self.presented.lock().unwrap().clone()
    }
}

#[async_trait]
impl InteractionPresenter for RecordingPresenter {
    async fn present(
        &self,
        entity: &TrackedEntity,
        payload: &NotificationPayload,
    ) -> Result<(), DaybookError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DaybookError::platform("injected presenter failure"));
        }
        self.presented
            .lock()
            .unwrap()
            .push((entity.id.clone(), payload.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingActivityLog {
    events: Mutex<Vec<ActivityEvent>>,
    failing: AtomicBool,
}

impl RecordingActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Wait until at least `count` events arrived; events are written from
    /// spawned tasks. Returns the events seen when the wait ends.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<ActivityEvent> {
        let _ = tokio::time::timeout(timeout, async {
            while self.events.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        self.events()
    }
}

#[async_trait]
impl ActivityLog for RecordingActivityLog {
    async fn record(&self, event: ActivityEvent) -> Result<(), DaybookError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DaybookError::storage("injected activity log failure"));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
