// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-entity mutual exclusion.
//!
//! [`EntityLockManager`] serializes asynchronous operations that share a
//! `scope|entityId` key. Callers queue in arrival order on a fair
//! `tokio::sync::Mutex`. A failing operation releases the key like any other,
//! so later operations still run. A key's slot is removed as soon as nobody
//! holds or awaits it.

use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::trace;

#[derive(Default)]
struct Slot {
    gate: Arc<Mutex<()>>,
    /// Callers currently holding or waiting on `gate`.
    leases: usize,
}

/// FIFO-per-key async lock table.
#[derive(Default)]
pub struct EntityLockManager {
    slots: DashMap<String, Slot>,
}

impl EntityLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock key for an entity within a scope (module id).
    pub fn key(scope: &str, entity_id: &str) -> String {
        format!("{scope}|{entity_id}")
    }

    /// Run `action` once every earlier action queued on the same key has finished.
    ///
    /// The action's result, success or error, is returned to this caller only.
    pub async fn run_exclusive<F, Fut, T, E>(
        &self,
        scope: &str,
        entity_id: &str,
        action: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let lease = self.lease(Self::key(scope, entity_id));
        let _guard = lease.gate.lock().await;
        trace!(key = %lease.key, "entity lock acquired");
        action().await
    }

    /// Number of keys with an operation running or queued.
    pub fn in_flight_keys(&self) -> usize {
        self.slots.len()
    }

    fn lease(&self, key: String) -> Lease<'_> {
        let gate = {
            let mut slot = self.slots.entry(key.clone()).or_default();
            slot.leases += 1;
            slot.gate.clone()
        };
        #[cfg(feature = "prometheus")]
        daybook_prometheus::set_locks_in_flight(self.slots.len());
        Lease {
            manager: self,
            key,
            gate,
        }
    }
}

/// Registration on a key; dropping it (on completion or cancellation) releases the slot.
struct Lease<'a> {
    manager: &'a EntityLockManager,
    key: String,
    gate: Arc<Mutex<()>>,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if let Entry::Occupied(mut slot) = self.manager.slots.entry(self.key.clone()) {
            slot.get_mut().leases -= 1;
            if slot.get().leases == 0 {
                slot.remove();
            }
        }
        #[cfg(feature = "prometheus")]
        daybook_prometheus::set_locks_in_flight(self.manager.slots.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    type Log = Arc<std::sync::Mutex<Vec<&'static str>>>;

    fn push(log: &Log, entry: &'static str) {
        log.lock().unwrap().push(entry);
    }

    #[tokio::test]
    async fn same_key_runs_in_order() {
        let locks = EntityLockManager::new();
        let log: Log = Arc::default();

        let a = locks.run_exclusive("task", "t-1", || async {
            push(&log, "a:start");
            tokio::time::sleep(Duration::from_millis(20)).await;
            push(&log, "a:end");
            Ok::<_, ()>(1)
        });
        let b = locks.run_exclusive("task", "t-1", || async {
            push(&log, "b:start");
            push(&log, "b:end");
            Ok::<_, ()>(2)
        });

        let (ra, rb) = tokio::join!(a, b);
        assert_eq!((ra, rb), (Ok(1), Ok(2)));
        assert_eq!(*log.lock().unwrap(), vec!["a:start", "a:end", "b:start", "b:end"]);
        assert_eq!(locks.in_flight_keys(), 0);
    }

    #[tokio::test]
    async fn failure_does_not_poison_the_queue() {
        let locks = EntityLockManager::new();
        let log: Log = Arc::default();

        let a = locks.run_exclusive("habit", "h-1", || async {
            push(&log, "a:start");
            tokio::task::yield_now().await;
            push(&log, "a:fail");
            Err::<(), _>("boom")
        });
        let b = locks.run_exclusive("habit", "h-1", || async {
            push(&log, "b:run");
            Ok::<_, &str>(())
        });

        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(ra, Err("boom"));
        assert_eq!(rb, Ok(()));
        assert_eq!(*log.lock().unwrap(), vec!["a:start", "a:fail", "b:run"]);
    }

    #[tokio::test]
    async fn different_keys_may_interleave() {
        let locks = EntityLockManager::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        // `a` can only finish once `b` has run; serializing them would deadlock.
        let a = locks.run_exclusive("task", "t-1", || async move {
            rx.await.map_err(|_| "sender dropped")
        });
        let b = locks.run_exclusive("task", "t-2", || async move {
            tx.send(()).map_err(|_| "receiver dropped")
        });

        let joined = tokio::time::timeout(Duration::from_secs(2), async { tokio::join!(a, b) })
            .await
            .expect("independent keys must not block each other");
        assert_eq!(joined, (Ok(()), Ok(())));
    }

    #[tokio::test]
    async fn scope_is_part_of_the_key() {
        assert_ne!(
            EntityLockManager::key("task", "1"),
            EntityLockManager::key("habit", "1")
        );
    }

    #[tokio::test]
    async fn slot_is_released_after_drain() {
        let locks = Arc::new(EntityLockManager::new());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let held = {
            let locks = locks.clone();
            tokio::spawn(async move {
                locks
                    .run_exclusive("task", "t-1", || async move { rx.await.map_err(|_| ()) })
                    .await
            })
        };

        tokio::task::yield_now().await;
        while locks.in_flight_keys() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(locks.in_flight_keys(), 1);

        tx.send(()).unwrap();
        held.await.unwrap().unwrap();
        assert_eq!(locks.in_flight_keys(), 0);
    }

    #[tokio::test]
    async fn cancelled_waiter_releases_its_lease() {
        let locks = Arc::new(EntityLockManager::new());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let holder = {
            let locks = locks.clone();
            tokio::spawn(async move {
                locks
                    .run_exclusive("task", "t-1", || async move { rx.await.map_err(|_| ()) })
                    .await
            })
        };
        while locks.in_flight_keys() == 0 {
            tokio::task::yield_now().await;
        }

        let waiter = tokio::time::timeout(
            Duration::from_millis(20),
            locks.run_exclusive("task", "t-1", || async { Ok::<_, ()>(()) }),
        )
        .await;
        assert!(waiter.is_err(), "waiter should time out behind the holder");

        tx.send(()).unwrap();
        holder.await.unwrap().unwrap();
        assert_eq!(locks.in_flight_keys(), 0);
    }

    #[tokio::test]
    async fn read_modify_write_is_not_lost_under_contention() {
        let locks = EntityLockManager::new();
        let counter = Arc::new(std::sync::Mutex::new(0u32));

        let ops = (0..50).map(|_| {
            let counter = counter.clone();
            locks.run_exclusive("task", "shared", move || async move {
                let read = *counter.lock().unwrap();
                tokio::task::yield_now().await;
                *counter.lock().unwrap() = read + 1;
                Ok::<_, ()>(())
            })
        });
        for result in futures::future::join_all(ops).await {
            result.unwrap();
        }

        assert_eq!(*counter.lock().unwrap(), 50);
        assert_eq!(locks.in_flight_keys(), 0);
    }
}
