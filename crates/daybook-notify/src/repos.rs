// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use daybook_core::{EntityKind, EntityRepository};

/// The task and habit repositories, selected by entity kind.
#[derive(Clone)]
pub struct EntityRepositories {
    pub tasks: Arc<dyn EntityRepository>,
    pub habits: Arc<dyn EntityRepository>,
}

impl EntityRepositories {
    pub fn new(tasks: Arc<dyn EntityRepository>, habits: Arc<dyn EntityRepository>) -> Self {
        Self { tasks, habits }
    }

    pub fn for_kind(&self, kind: EntityKind) -> &Arc<dyn EntityRepository> {
        match kind {
            EntityKind::Task => &self.tasks,
            EntityKind::Habit => &self.habits,
        }
    }
}
