// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds per-run provider clients from stored mail accounts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use draftline_config::model::{GmailConfig, OutlookConfig};
use draftline_core::types::{MailProviderKind, MerchantId};
use draftline_core::{DraftlineError, MailAccountStore, MailConnector, MailProvider};
use tracing::debug;

use crate::api::ApiClient;
use crate::gmail::GmailProvider;
use crate::oauth::{OAuthClient, TokenSource};
use crate::outlook::OutlookProvider;

const OUTLOOK_SCOPE: &str = "https://graph.microsoft.com/.default offline_access";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// [`MailConnector`] backed by a [`MailAccountStore`].
pub struct ProviderConnector {
    gmail: GmailConfig,
    outlook: OutlookConfig,
    accounts: Arc<dyn MailAccountStore>,
    http: reqwest::Client,
}

impl ProviderConnector {
    pub fn new(
        gmail: GmailConfig,
        outlook: OutlookConfig,
        accounts: Arc<dyn MailAccountStore>,
    ) -> Result<Self, DraftlineError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| DraftlineError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            gmail,
            outlook,
            accounts,
            http,
        })
    }

    fn oauth_client(&self, provider: MailProviderKind) -> OAuthClient {
        match provider {
            MailProviderKind::Gmail => OAuthClient {
                token_url: self.gmail.token_url.clone(),
                client_id: self.gmail.client_id.clone(),
                client_secret: self.gmail.client_secret.clone(),
                scope: None,
            },
            MailProviderKind::Outlook => OAuthClient {
                token_url: self.outlook.token_url.clone(),
                client_id: self.outlook.client_id.clone(),
                client_secret: self.outlook.client_secret.clone(),
                scope: Some(OUTLOOK_SCOPE.to_string()),
            },
        }
    }
}

#[async_trait]
impl MailConnector for ProviderConnector {
    async fn connect(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
    ) -> Result<Arc<dyn MailProvider>, DraftlineError> {
        let account = self
            .accounts
            .mail_account(merchant, provider)
            .await?
            .ok_or_else(|| {
                DraftlineError::Permission(format!("no {} account linked for merchant {merchant}", provider.as_str()))
            })?;
        let email = account.email_address.clone();

        let tokens = Arc::new(TokenSource::new(
            account,
            self.oauth_client(provider),
            self.http.clone(),
            Arc::clone(&self.accounts),
        ));
        // Surface missing or revoked credentials before any listing happens.
        tokens.access_token().await?;
        debug!(merchant_id = %merchant, provider = provider.as_str(), "mail provider connected");

        let api = ApiClient::new(self.http.clone(), tokens, provider);
        let client: Arc<dyn MailProvider> = match provider {
            MailProviderKind::Gmail => Arc::new(GmailProvider::new(api, &self.gmail.api_base, email)),
            MailProviderKind::Outlook => Arc::new(OutlookProvider::new(api, &self.outlook.api_base)),
        };
        Ok(client)
    }
}
