// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the notification subsystem.
//!
//! Everything outside the coordination core (durable storage, the platform
//! lock bridge, repositories, the OS scheduler, module adapters) sits behind
//! one of these traits and uses `#[async_trait]` for dynamic dispatch.

pub mod activity;
pub mod hub;
pub mod platform;
pub mod policy;
pub mod repository;
pub mod scheduler;
pub mod storage;
pub mod universal;

pub use activity::{ActivityLog, InteractionPresenter};
pub use hub::ModuleAdapterHub;
pub use platform::LockStateOracle;
pub use policy::{ModulePolicy, SnoozeSettingsProvider};
pub use repository::EntityRepository;
pub use scheduler::NotificationScheduler;
pub use storage::KeyValueStore;
pub use universal::UniversalReminders;
