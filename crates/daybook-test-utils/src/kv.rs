// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory key-value store.
//!
//! Reads are served from a cache that only picks up out-of-band writes (made
//! with [`MemoryKeyValueStore::write_externally`]) after `reload()`, mirroring a
//! preference store shared with a native process.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use daybook_core::{DaybookError, KeyValueStore};
use daybook_storage::StoredValue;

#[derive(Default)]
pub struct MemoryKeyValueStore {
    durable: Mutex<HashMap<String, StoredValue>>,
    cache: Mutex<HashMap<String, StoredValue>>,
    reloads: AtomicUsize,
    fail_writes: AtomicBool,
    failing_keys: Mutex<HashSet<String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write to the durable layer only, as another process would.
    pub fn write_externally(&self, key: &str, value: StoredValue) {
        self.durable.lock().unwrap().insert(key.to_string(), value);
    }

    /// Make every subsequent write (and remove) fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make writes (and removes) of `key` alone fail.
    pub fn fail_writes_to(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    /// The cached value for `key`, if any.
    pub fn value(&self, key: &str) -> Option<StoredValue> {
        self.cache.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.lock().unwrap().contains_key(key)
    }

    fn read<T>(
        &self,
        key: &str,
        extract: impl FnOnce(&StoredValue) -> Option<T>,
    ) -> Result<Option<T>, DaybookError> {
        match self.cache.lock().unwrap().get(key) {
            None => Ok(None),
            Some(value) => extract(value).map(Some).ok_or_else(|| {
                DaybookError::storage(format!("key `{key}` holds a {} value", value.kind()))
            }),
        }
    }

    fn write(&self, key: &str, value: StoredValue) -> Result<(), DaybookError> {
        self.check_writable(key)?;
        self.durable
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        self.cache.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    fn check_writable(&self, key: &str) -> Result<(), DaybookError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DaybookError::storage("injected write failure"));
        }
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(DaybookError::storage(format!("injected write failure for `{key}`")));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, DaybookError> {
        self.read(key, |v| match v {
            StoredValue::Str(s) => Some(s.clone()),
            _ => None,
        })
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<(), DaybookError> {
        self.write(key, StoredValue::Str(value.to_string()))
    }

    async fn get_int(&self, key: &str) -> Result<Option<i64>, DaybookError> {
        self.read(key, |v| match v {
            StoredValue::Int(i) => Some(*i),
            _ => None,
        })
    }

    async fn set_int(&self, key: &str, value: i64) -> Result<(), DaybookError> {
        self.write(key, StoredValue::Int(value))
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>, DaybookError> {
        self.read(key, |v| match v {
            StoredValue::Bool(b) => Some(*b),
            _ => None,
        })
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), DaybookError> {
        self.write(key, StoredValue::Bool(value))
    }

    async fn remove(&self, key: &str) -> Result<(), DaybookError> {
        self.check_writable(key)?;
        self.durable.lock().unwrap().remove(key);
        self.cache.lock().unwrap().remove(key);
        Ok(())
    }

    async fn reload(&self) -> Result<(), DaybookError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        let durable = self.durable.lock().unwrap().clone();
        *self.cache.lock().unwrap() = durable;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn external_writes_need_reload() {
        let kv = MemoryKeyValueStore::new();
        kv.write_externally("k", StoredValue::Str("native".into()));
        assert_eq!(kv.get_string("k").await.unwrap(), None);

        kv.reload().await.unwrap();
        assert_eq!(kv.get_string("k").await.unwrap().as_deref(), Some("native"));
        assert_eq!(kv.reload_count(), 1);
    }

    #[tokio::test]
    async fn kind_mismatch_is_an_error() {
        let kv = MemoryKeyValueStore::new();
        kv.set_int("n", 3).await.unwrap();
        assert!(kv.get_string("n").await.is_err());
        assert_eq!(kv.get_int("n").await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn injected_write_failure() {
        let kv = MemoryKeyValueStore::new();
        kv.set_fail_writes(true);
        assert!(kv.set_bool("b", true).await.is_err());
        assert!(!kv.contains("b"));
    }
}
