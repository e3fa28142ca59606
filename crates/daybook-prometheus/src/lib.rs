// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for Daybook.
//!
//! Recording goes through the metrics-rs facade, so the helpers in
//! [`recording`] are no-ops until a recorder is installed. [`PrometheusRecorder`]
//! installs the Prometheus exporter and renders the text exposition format.

pub mod recording;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use daybook_core::DaybookError;

pub use recording::{
    record_event, record_scheduled, record_skip, register_metrics, set_locks_in_flight,
};

/// Process-wide Prometheus recorder.
pub struct PrometheusRecorder {
    handle: PrometheusHandle,
}

impl PrometheusRecorder {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn install() -> Result<Self, DaybookError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            DaybookError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
