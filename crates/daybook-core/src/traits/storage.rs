// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable key-value storage for small scalar values.

use async_trait::async_trait;

use crate::error::DaybookError;

/// Process-surviving storage for string, integer, and boolean scalars.
///
/// Implementations may cache values in memory; [`reload`](KeyValueStore::reload)
/// refreshes that cache from durable storage so writes made outside this
/// process (for example by native code) become visible.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get_string(&self, key: &str) -> Result<Option<String>, DaybookError>;

    async fn set_string(&self, key: &str, value: &str) -> Result<(), DaybookError>;

    async fn get_int(&self, key: &str) -> Result<Option<i64>, DaybookError>;

    async fn set_int(&self, key: &str, value: i64) -> Result<(), DaybookError>;

    async fn get_bool(&self, key: &str) -> Result<Option<bool>, DaybookError>;

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), DaybookError>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), DaybookError>;

    /// Best-effort refresh from durable storage.
    async fn reload(&self) -> Result<(), DaybookError>;
}
