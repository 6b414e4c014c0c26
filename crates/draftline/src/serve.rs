// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `draftline serve` command implementation.
//!
//! Starts the HTTP gateway (`/v1/poll`, `/v1/drafts`, `/health`, `/metrics`)
//! and, when `scheduler.cron` is set, an in-process poller on that schedule.
//! Both stop on SIGINT/SIGTERM.

use std::sync::Arc;

use draftline_config::model::DraftlineConfig;
use draftline_core::error::DraftlineError;
use draftline_cron::{parse_schedule, spawn_poller};
use draftline_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig, start_server};
use tracing::{info, warn};

use crate::runtime::build_runtime;
use crate::shutdown;

/// Runs the `draftline serve` command until a shutdown signal arrives.
pub async fn run_serve(config: DraftlineConfig) -> Result<(), DraftlineError> {
    info!(service = %config.service.name, "starting draftline serve");

    // Reject a bad schedule before binding anything.
    let schedule = config
        .scheduler
        .cron
        .as_deref()
        .map(parse_schedule)
        .transpose()?;

    let runtime = build_runtime(&config, true).await?;

    let auth = AuthConfig {
        cron_secret: config.gateway.cron_secret.clone(),
        internal_secret: config.gateway.internal_secret.clone(),
    };
    if auth.cron_secret.is_none() && auth.internal_secret.is_none() {
        warn!("no gateway secrets configured; /v1/poll and /v1/drafts will refuse every request");
    }

    let prometheus_render = runtime.metrics.clone().map(|adapter| {
        Arc::new(move || adapter.render()) as Arc<dyn Fn() -> String + Send + Sync>
    });

    let state = GatewayState {
        pipeline: runtime.pipeline.clone(),
        scheduler: runtime.scheduler.clone(),
        directory: runtime.storage.clone(),
        auth,
        health: HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render,
            adapters: runtime.adapters.clone(),
        },
    };

    let cancel = shutdown::install_signal_handler();

    let poller = schedule.map(|schedule| {
        info!(cron = ?config.scheduler.cron, "in-process poller enabled");
        spawn_poller(runtime.scheduler.clone(), schedule, cancel.clone())
    });

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let served = start_server(&server_config, state, cancel.clone()).await;

    // The server can also stop on its own (bind failure); take the poller down with it.
    cancel.cancel();
    if let Some(poller) = poller {
        let _ = poller.await;
    }

    let closed = runtime.shutdown().await;
    served?;
    closed?;

    info!("draftline serve shutdown complete");
    Ok(())
}
