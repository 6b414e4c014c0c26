// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated request helper with one refresh-then-retry on 401.

use std::sync::Arc;

use draftline_core::DraftlineError;
use draftline_core::types::MailProviderKind;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::oauth::TokenSource;

pub(crate) struct ApiClient {
    http: reqwest::Client,
    tokens: Arc<TokenSource>,
    provider: MailProviderKind,
}

impl ApiClient {
    pub(crate) fn new(http: reqwest::Client, tokens: Arc<TokenSource>, provider: MailProviderKind) -> Self {
        Self {
            http,
            tokens,
            provider,
        }
    }

    /// Send a request built by `build`. A 401 triggers one token refresh and
    /// a single resend; a second 401 becomes [`DraftlineError::Permission`].
    /// Any other status is returned to the caller.
    pub(crate) async fn send<F>(&self, build: F) -> Result<Response, DraftlineError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let token = self.tokens.access_token().await?;
        let response = self.dispatch(build(&self.http).bearer_auth(token.expose_secret())).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(provider = self.provider.as_str(), "401 from mail API, refreshing token");
        let token = self.tokens.force_refresh().await?;
        let response = self.dispatch(build(&self.http).bearer_auth(token.expose_secret())).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(DraftlineError::Permission(format!(
                "{} rejected a freshly refreshed token",
                self.provider.as_str()
            )));
        }
        Ok(response)
    }

    /// Like [`send`](Self::send) but maps non-2xx to [`DraftlineError::Mail`].
    pub(crate) async fn send_ok<F>(&self, build: F, what: &str) -> Result<Response, DraftlineError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let response = self.send(build).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::FORBIDDEN {
            return Err(DraftlineError::Permission(format!(
                "{} denied {what}: {body}",
                self.provider.as_str()
            )));
        }
        Err(DraftlineError::Mail {
            message: format!("{} {what} returned {status}: {body}", self.provider.as_str()),
            status: Some(status.as_u16()),
            source: None,
        })
    }

    pub(crate) async fn json<T, F>(&self, build: F, what: &str) -> Result<T, DraftlineError>
    where
        T: DeserializeOwned,
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let response = self.send_ok(build, what).await?;
        response.json::<T>().await.map_err(|e| DraftlineError::Mail {
            message: format!("{} {what}: malformed response: {e}", self.provider.as_str()),
            status: None,
            source: Some(Box::new(e)),
        })
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, DraftlineError> {
        request.send().await.map_err(|e| DraftlineError::Mail {
            message: format!("{} request failed: {e}", self.provider.as_str()),
            status: None,
            source: Some(Box::new(e)),
        })
    }
}
