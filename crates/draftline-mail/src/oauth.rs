// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth access-token lifecycle for one linked mailbox.
//!
//! A [`TokenSource`] lives for a single merchant run. It hands out the
//! stored access token until shortly before expiry, refreshes it through the
//! provider's token endpoint when needed and writes the result back through
//! [`MailAccountStore`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use draftline_core::types::{MailAccount, MailProviderKind, MerchantId};
use draftline_core::{DraftlineError, MailAccountStore};
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tokens within this window of expiry are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Token endpoint and client registration for one provider.
#[derive(Clone)]
pub struct OAuthClient {
    pub token_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

struct TokenState {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    fn usable(&self, now: DateTime<Utc>) -> Option<SecretString> {
        let token = self.access_token.as_ref()?;
        match self.expires_at {
            Some(at) if at - Duration::seconds(EXPIRY_SKEW_SECS) <= now => None,
            _ => Some(token.clone()),
        }
    }
}

/// Per-run access token provider for one mailbox.
pub struct TokenSource {
    merchant: MerchantId,
    provider: MailProviderKind,
    oauth: OAuthClient,
    http: reqwest::Client,
    store: Arc<dyn MailAccountStore>,
    state: Mutex<TokenState>,
}

impl TokenSource {
    pub fn new(
        account: MailAccount,
        oauth: OAuthClient,
        http: reqwest::Client,
        store: Arc<dyn MailAccountStore>,
    ) -> Self {
        Self {
            merchant: account.merchant_id,
            provider: account.provider,
            oauth,
            http,
            store,
            state: Mutex::new(TokenState {
                access_token: account.access_token,
                refresh_token: account.refresh_token,
                expires_at: account.expires_at,
            }),
        }
    }

    /// A token valid for at least the skew window, refreshing if necessary.
    pub async fn access_token(&self) -> Result<SecretString, DraftlineError> {
        let mut state = self.state.lock().await;
        if let Some(token) = state.usable(Utc::now()) {
            return Ok(token);
        }
        debug!(provider = self.provider.as_str(), "access token missing or near expiry");
        self.refresh_locked(&mut state).await
    }

    /// Refresh unconditionally. Used after the API rejected a token with 401.
    pub async fn force_refresh(&self) -> Result<SecretString, DraftlineError> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    async fn refresh_locked(&self, state: &mut TokenState) -> Result<SecretString, DraftlineError> {
        let Some(refresh_token) = state.refresh_token.clone() else {
            return Err(DraftlineError::Permission(format!(
                "{} account has no refresh token; reconnect the mailbox",
                self.provider.as_str()
            )));
        };

        // The serializer is not `Send`; it must be gone before the first await.
        let form = {
            let mut form = url::form_urlencoded::Serializer::new(String::new());
            form.append_pair("grant_type", "refresh_token");
            form.append_pair("refresh_token", refresh_token.expose_secret());
            if let Some(id) = &self.oauth.client_id {
                form.append_pair("client_id", id);
            }
            if let Some(secret) = &self.oauth.client_secret {
                form.append_pair("client_secret", secret);
            }
            if let Some(scope) = &self.oauth.scope {
                form.append_pair("scope", scope);
            }
            form.finish()
        };

        let response = self
            .http
            .post(&self.oauth.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|e| DraftlineError::Mail {
                message: format!("token refresh request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                merchant_id = %self.merchant,
                provider = self.provider.as_str(),
                status = status.as_u16(),
                "token refresh rejected"
            );
            if status.is_server_error() {
                return Err(DraftlineError::Mail {
                    message: format!("token endpoint returned {status}"),
                    status: Some(status.as_u16()),
                    source: None,
                });
            }
            return Err(DraftlineError::Permission(format!(
                "{} token refresh failed ({status}): {body}",
                self.provider.as_str()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| DraftlineError::Mail {
            message: format!("malformed token response: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;

        let expires_at = Utc::now()
            + Duration::seconds(token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
        if let Err(e) = self
            .store
            .update_tokens(
                &self.merchant,
                self.provider,
                &token.access_token,
                token.refresh_token.as_deref(),
                expires_at,
            )
            .await
        {
            warn!(
                merchant_id = %self.merchant,
                provider = self.provider.as_str(),
                error = %e,
                "failed to persist refreshed token"
            );
        }

        let access = SecretString::from(token.access_token);
        state.access_token = Some(access.clone());
        state.expires_at = Some(expires_at);
        if let Some(rotated) = token.refresh_token {
            state.refresh_token = Some(SecretString::from(rotated));
        }
        info!(
            merchant_id = %self.merchant,
            provider = self.provider.as_str(),
            "access token refreshed"
        );
        Ok(access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_futures_are_send() {
        // Compiles only if the refresh path holds nothing `!Send` across an await.
        fn assert_send<T: Send>(_: T) {}
        fn _check(source: &TokenSource) {
            assert_send(source.access_token());
            assert_send(source.force_refresh());
        }
    }

    #[test]
    fn token_near_expiry_is_not_usable() {
        let now = Utc::now();
        let state = TokenState {
            access_token: Some(SecretString::from("a".to_string())),
            refresh_token: None,
            expires_at: Some(now + Duration::seconds(30)),
        };
        assert!(state.usable(now).is_none());

        let state = TokenState {
            expires_at: Some(now + Duration::seconds(600)),
            ..state
        };
        assert!(state.usable(now).is_some());
    }

    #[test]
    fn token_without_expiry_is_trusted() {
        let state = TokenState {
            access_token: Some(SecretString::from("a".to_string())),
            refresh_token: None,
            expires_at: None,
        };
        assert!(state.usable(Utc::now()).is_some());
    }

    #[test]
    fn debug_redacts_client_secret() {
        let client = OAuthClient {
            token_url: "https://example.com/token".into(),
            client_id: Some("id".into()),
            client_secret: Some("very-secret".into()),
            scope: None,
        };
        assert!(!format!("{client:?}").contains("very-secret"));
    }
}
