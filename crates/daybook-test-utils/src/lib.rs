// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Daybook.
//!
//! Provides in-memory fakes for every collaborator trait in `daybook-core` and
//! a harness that wires them into a router and coordinator.
//!
//! # Components
//!
//! - [`MemoryKeyValueStore`] - KV store with a separate durable layer for `reload()` tests
//! - [`MockLockOracle`] / [`ManualClock`] - controllable device lock state and time
//! - [`InMemoryEntityRepository`] - task/habit storage with lookup counters
//! - [`RecordingScheduler`] - OS scheduler that records calls and hides alarms from `pending()`
//! - [`MockHub`] / [`MockUniversalReminders`] - module dispatch and universal reminder fakes
//! - [`RecordingPresenter`] / [`RecordingActivityLog`] - captured side effects
//! - [`TestHarness`] - everything above wired together

pub mod harness;
pub mod hub;
pub mod kv;
pub mod platform;
pub mod repository;
pub mod scheduler;
pub mod sinks;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use hub::{MockHub, MockUniversalReminders};
pub use kv::MemoryKeyValueStore;
pub use platform::{ManualClock, MockLockOracle};
pub use repository::InMemoryEntityRepository;
pub use scheduler::{RecordingScheduler, SchedulerCall};
pub use sinks::{RecordingActivityLog, RecordingPresenter};
