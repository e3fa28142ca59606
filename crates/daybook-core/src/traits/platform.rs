// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform bridge for device lock state.

use async_trait::async_trait;

use crate::error::DaybookError;

/// Answers whether the device screen is currently locked.
///
/// Platforms without a secure lock screen always report `false`.
#[async_trait]
pub trait LockStateOracle: Send + Sync + 'static {
    async fn is_locked(&self) -> Result<bool, DaybookError>;
}
