// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory task/habit repository.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use daybook_core::{DaybookError, EntityRepository, TrackedEntity};

/// Entity store that counts lookups so tests can assert none happened.
#[derive(Default)]
pub struct InMemoryEntityRepository {
    entities: Mutex<HashMap<String, TrackedEntity>>,
    lookups: AtomicUsize,
    updates: AtomicUsize,
    fail_updates: AtomicBool,
}

impl InMemoryEntityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(entities: impl IntoIterator<Item = TrackedEntity>) -> Self {
        let repo = Self::new();
        for entity in entities {
            repo.insert(entity);
        }
        repo
    }

    pub fn insert(&self, entity: TrackedEntity) {
        self.entities
            .lock()
            .unwrap()
            .insert(entity.id.clone(), entity);
    }

    pub fn remove(&self, id: &str) -> Option<TrackedEntity> {
        self.entities.lock().unwrap().remove(id)
    }

    /// Current stored copy, without counting as a lookup.
    pub fn get(&self, id: &str) -> Option<TrackedEntity> {
        self.entities.lock().unwrap().get(id).cloned()
    }

    /// `get_by_id` and `exists` calls so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntityRepository for InMemoryEntityRepository {
    async fn get_by_id(&self, id: &str) -> Result<Option<TrackedEntity>, DaybookError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(id))
    }

    async fn update(&self, entity: &TrackedEntity) -> Result<(), DaybookError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(DaybookError::repository("injected update failure"));
        }
        let mut entities = self.entities.lock().unwrap();
        match entities.get_mut(&entity.id) {
            Some(stored) => {
                *stored = entity.clone();
                Ok(())
            }
            None => Err(DaybookError::EntityNotFound {
                module: entity.kind.to_string(),
                id: entity.id.clone(),
            }),
        }
    }
}
