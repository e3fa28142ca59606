// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Controllable device lock state and clock.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use daybook_core::{Clock, DaybookError, LockStateOracle};

/// Lock oracle whose answer (or failure) is set by the test.
#[derive(Default)]
pub struct MockLockOracle {
    locked: AtomicBool,
    failing: AtomicBool,
    queries: AtomicUsize,
}

impl MockLockOracle {
    pub fn new(locked: bool) -> Self {
        Self {
            locked: AtomicBool::new(locked),
            ..Self::default()
        }
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }

    /// Make `is_locked()` return a platform error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LockStateOracle for MockLockOracle {
    async fn is_locked(&self) -> Result<bool, DaybookError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DaybookError::platform("keyguard query failed"));
        }
        Ok(self.locked.load(Ordering::SeqCst))
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// 2026-03-02 09:00:00 UTC, a fixed instant for deterministic tests.
    pub fn fixed() -> Self {
        Self::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
