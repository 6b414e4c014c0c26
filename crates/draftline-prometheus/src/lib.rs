// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for Draftline.
//!
//! Uses the metrics-rs facade with the Prometheus exporter.
//! Metrics are rendered as Prometheus text format via the `render()` method,
//! which is exposed through the gateway's /metrics endpoint.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use draftline_core::DraftlineError;
use draftline_core::traits::adapter::PluginAdapter;
use draftline_core::types::{AdapterType, HealthStatus};

pub use recording::{
    record_action, record_generation_fallback, record_message, record_poll_run, register_metrics,
};

/// Prometheus metrics adapter.
///
/// Installs the Prometheus recorder and exposes a handle for rendering
/// metrics in Prometheus text format.
#[derive(Clone)]
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Installs the Prometheus recorder globally. Only one recorder can be
    /// installed per process. Returns an error if a recorder is already installed.
    pub fn new() -> Result<Self, DraftlineError> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| DraftlineError::Internal(format!("failed to install Prometheus recorder: {e}")))?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Wrap an existing handle (a recorder built but not installed globally).
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, DraftlineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DraftlineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_counters_render_with_labels() {
        // A local recorder; the global one can only be installed once per process.
        let recorder = PrometheusBuilder::new().build_recorder();
        let adapter = PrometheusAdapter::from_handle(recorder.handle());

        metrics::with_local_recorder(&recorder, || {
            record_message("drafted");
            record_message("drafted");
            record_action("add_tag", true);
            record_poll_run();
        });

        let text = adapter.render();
        assert!(text.contains("draftline_messages_total{outcome=\"drafted\"} 2"));
        assert!(text.contains("draftline_actions_total{"));
        assert!(text.contains("type=\"add_tag\""));
        assert!(text.contains("draftline_poll_runs_total 1"));
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        record_generation_fallback();
        record_action("cancel_order", false);
    }
}
