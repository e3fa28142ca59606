// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording OS notification scheduler.
//!
//! Alarm-delivery requests are tracked separately and never appear in
//! `pending()`, since the platform offers no way to list them.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use daybook_core::{
    DaybookError, Delivery, NotificationScheduler, PendingNotification, ScheduleRequest,
};

/// One mutating call seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCall {
    Schedule(ScheduleRequest),
    Cancel(i32),
}

#[derive(Default)]
pub struct RecordingScheduler {
    notifications: Mutex<BTreeMap<i32, PendingNotification>>,
    alarms: Mutex<BTreeMap<i32, ScheduleRequest>>,
    calls: Mutex<Vec<SchedulerCall>>,
    yield_inside_calls: AtomicBool,
    fail_schedule: AtomicBool,
    fail_pending: AtomicBool,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield to the runtime in the middle of every schedule/cancel, so
    /// unsynchronized callers would interleave.
    pub fn set_yield_inside_calls(&self, on: bool) {
        self.yield_inside_calls.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_schedule(&self, fail: bool) {
        self.fail_schedule.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_pending(&self, fail: bool) {
        self.fail_pending.store(fail, Ordering::SeqCst);
    }

    /// Register a notification as already shown or scheduled.
    pub fn show(&self, id: i32, payload: &str) {
        self.notifications.lock().unwrap().insert(
            id,
            PendingNotification {
                id,
                payload: Some(payload.to_string()),
                kind: Some("shown".to_string()),
            },
        );
    }

    pub fn pending_ids(&self) -> Vec<i32> {
        self.notifications.lock().unwrap().keys().copied().collect()
    }

    pub fn alarm_ids(&self) -> Vec<i32> {
        self.alarms.lock().unwrap().keys().copied().collect()
    }

    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn scheduled(&self) -> Vec<ScheduleRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SchedulerCall::Schedule(request) => Some(request),
                SchedulerCall::Cancel(_) => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<i32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SchedulerCall::Cancel(id) => Some(id),
                SchedulerCall::Schedule(_) => None,
            })
            .collect()
    }

    async fn maybe_yield(&self) {
        if self.yield_inside_calls.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl NotificationScheduler for RecordingScheduler {
    async fn schedule(&self, request: ScheduleRequest) -> Result<(), DaybookError> {
        if self.fail_schedule.load(Ordering::SeqCst) {
            return Err(DaybookError::scheduler("injected schedule failure"));
        }
        self.calls
            .lock()
            .unwrap()
            .push(SchedulerCall::Schedule(request.clone()));
        self.maybe_yield().await;
        match request.delivery {
            Delivery::Alarm => {
                self.alarms.lock().unwrap().insert(request.id, request);
            }
            Delivery::Notification => {
                self.notifications.lock().unwrap().insert(
                    request.id,
                    PendingNotification {
                        id: request.id,
                        payload: Some(request.payload),
                        kind: Some(request.channel),
                    },
                );
            }
        }
        Ok(())
    }

    async fn cancel(&self, id: i32) -> Result<(), DaybookError> {
        self.calls.lock().unwrap().push(SchedulerCall::Cancel(id));
        self.maybe_yield().await;
        self.notifications.lock().unwrap().remove(&id);
        self.alarms.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<PendingNotification>, DaybookError> {
        if self.fail_pending.load(Ordering::SeqCst) {
            return Err(DaybookError::scheduler("injected pending failure"));
        }
        Ok(self.notifications.lock().unwrap().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(id: i32, delivery: Delivery) -> ScheduleRequest {
        ScheduleRequest {
            id,
            at: Utc::now(),
            payload: format!("task|t-{id}|reminder|5|minutes"),
            channel: "task_reminders".into(),
            title: "t".into(),
            body: "b".into(),
            delivery,
        }
    }

    #[tokio::test]
    async fn alarms_are_not_listed() {
        let scheduler = RecordingScheduler::new();
        scheduler.schedule(request(1, Delivery::Notification)).await.unwrap();
        scheduler.schedule(request(2, Delivery::Alarm)).await.unwrap();

        let pending: Vec<i32> = scheduler.pending().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(pending, vec![1]);
        assert_eq!(scheduler.alarm_ids(), vec![2]);

        scheduler.cancel(2).await.unwrap();
        assert!(scheduler.alarm_ids().is_empty());
    }
}
