// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `KeyValueStore` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use daybook_config::model::StorageConfig;
use daybook_core::{DaybookError, KeyValueStore};

use crate::database::Database;
use crate::models::StoredValue;
use crate::queries;

/// Cached key-value store backed by the `key_value` table.
///
/// Reads are served from an in-process cache that is filled on open.
/// Writes go to SQLite first and then update the cache. Another process (or
/// native code) writing the same database is only observed after
/// [`reload`](KeyValueStore::reload).
pub struct SqliteKeyValueStore {
    db: Database,
    cache: RwLock<HashMap<String, StoredValue>>,
}

impl SqliteKeyValueStore {
    /// Open the store described by `config` and warm the cache.
    pub async fn open(config: &StorageConfig) -> Result<Self, DaybookError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        Self::from_database(db).await
    }

    /// Wrap an already-open database.
    pub async fn from_database(db: Database) -> Result<Self, DaybookError> {
        let rows = queries::kv::load_all(&db).await?;
        debug!(keys = rows.len(), "key-value cache warmed");
        Ok(Self {
            db,
            cache: RwLock::new(rows.into_iter().collect()),
        })
    }

    /// All cached keys with their values, sorted by key.
    pub async fn snapshot(&self) -> Vec<(String, StoredValue)> {
        let mut entries: Vec<_> = self
            .cache
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Close the underlying database.
    pub async fn close(self) -> Result<(), DaybookError> {
        self.db.close().await
    }

    async fn cached(&self, key: &str) -> Option<StoredValue> {
        self.cache.read().await.get(key).cloned()
    }

    async fn put(&self, key: &str, value: StoredValue) -> Result<(), DaybookError> {
        queries::kv::upsert(&self.db, key, &value).await?;
        self.cache.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

fn type_mismatch(key: &str, expected: &str, found: &StoredValue) -> DaybookError {
    DaybookError::storage(format!(
        "key `{key}` holds a {} value, expected {expected}",
        found.kind()
    ))
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, DaybookError> {
        match self.cached(key).await {
            None => Ok(None),
            Some(StoredValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(type_mismatch(key, "string", &other)),
        }
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<(), DaybookError> {
        self.put(key, StoredValue::Str(value.to_string())).await
    }

    async fn get_int(&self, key: &str) -> Result<Option<i64>, DaybookError> {
        match self.cached(key).await {
            None => Ok(None),
            Some(StoredValue::Int(i)) => Ok(Some(i)),
            Some(other) => Err(type_mismatch(key, "int", &other)),
        }
    }

    async fn set_int(&self, key: &str, value: i64) -> Result<(), DaybookError> {
        self.put(key, StoredValue::Int(value)).await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>, DaybookError> {
        match self.cached(key).await {
            None => Ok(None),
            Some(StoredValue::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(type_mismatch(key, "bool", &other)),
        }
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), DaybookError> {
        self.put(key, StoredValue::Bool(value)).await
    }

    async fn remove(&self, key: &str) -> Result<(), DaybookError> {
        queries::kv::delete(&self.db, key).await?;
        self.cache.write().await.remove(key);
        Ok(())
    }

    async fn reload(&self) -> Result<(), DaybookError> {
        let rows = queries::kv::load_all(&self.db).await?;
        let mut cache = self.cache.write().await;
        *cache = rows.into_iter().collect();
        debug!(keys = cache.len(), "key-value cache reloaded");
        Ok(())
    }
}
