// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP trigger surface for Draftline.
//!
//! Exposes the poll trigger used by cron callers, the per-message draft
//! endpoint used by other services (and by remote schedulers), and the
//! public health and metrics endpoints.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, HealthState, ServerConfig, router, start_server};
