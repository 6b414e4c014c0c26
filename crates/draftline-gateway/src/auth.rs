// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared-secret authentication for the trigger endpoints.
//!
//! Poll triggers accept either `x-cron-secret` (the scheduler's cron caller)
//! or `x-internal-secret` (other services). The draft endpoint accepts only
//! `x-internal-secret`. A secret that is not configured never matches, so a
//! gateway with no secrets rejects every protected request (fail-closed).

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::handlers::ErrorResponse;

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// Configured secrets.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub cron_secret: Option<String>,
    pub internal_secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("cron_secret", &self.cron_secret.as_ref().map(|_| "[redacted]"))
            .field(
                "internal_secret",
                &self.internal_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

fn header_matches(headers: &HeaderMap, name: &str, expected: Option<&str>) -> bool {
    let Some(expected) = expected.filter(|e| !e.is_empty()) else {
        return false;
    };
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|given| given == expected)
}

impl AuthConfig {
    pub fn allows_poll(&self, headers: &HeaderMap) -> bool {
        header_matches(headers, CRON_SECRET_HEADER, self.cron_secret.as_deref())
            || self.allows_internal(headers)
    }

    pub fn allows_internal(&self, headers: &HeaderMap) -> bool {
        header_matches(headers, INTERNAL_SECRET_HEADER, self.internal_secret.as_deref())
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "unauthorized".to_string(),
        }),
    )
        .into_response()
}

/// Guards `POST /v1/poll`.
pub async fn poll_auth(State(auth): State<AuthConfig>, request: Request, next: Next) -> Response {
    if auth.cron_secret.is_none() && auth.internal_secret.is_none() {
        tracing::error!("gateway has no secrets configured -- rejecting poll trigger");
        return unauthorized();
    }
    if !auth.allows_poll(request.headers()) {
        return unauthorized();
    }
    next.run(request).await
}

/// Guards `POST /v1/drafts`.
pub async fn internal_auth(State(auth): State<AuthConfig>, request: Request, next: Next) -> Response {
    if !auth.allows_internal(request.headers()) {
        return unauthorized();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn poll_accepts_either_secret() {
        let auth = AuthConfig {
            cron_secret: Some("cron".into()),
            internal_secret: Some("internal".into()),
        };
        assert!(auth.allows_poll(&headers(&[(CRON_SECRET_HEADER, "cron")])));
        assert!(auth.allows_poll(&headers(&[(INTERNAL_SECRET_HEADER, "internal")])));
        assert!(!auth.allows_poll(&headers(&[(CRON_SECRET_HEADER, "internal")])));
        assert!(!auth.allows_poll(&headers(&[])));
    }

    #[test]
    fn drafts_require_internal_secret() {
        let auth = AuthConfig {
            cron_secret: Some("cron".into()),
            internal_secret: Some("internal".into()),
        };
        assert!(!auth.allows_internal(&headers(&[(CRON_SECRET_HEADER, "cron")])));
        assert!(auth.allows_internal(&headers(&[(INTERNAL_SECRET_HEADER, "internal")])));
    }

    #[test]
    fn unset_or_empty_secret_never_matches() {
        let auth = AuthConfig {
            cron_secret: Some(String::new()),
            internal_secret: None,
        };
        assert!(!auth.allows_poll(&headers(&[(CRON_SECRET_HEADER, "")])));
        assert!(!auth.allows_internal(&headers(&[(INTERNAL_SECRET_HEADER, "")])));
    }

    #[test]
    fn debug_redacts_secrets() {
        let auth = AuthConfig {
            cron_secret: Some("hunter2".into()),
            internal_secret: None,
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
    }
}
