// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Linked mailboxes and store credentials.

use chrono::{DateTime, Utc};
use draftline_core::DraftlineError;
use draftline_core::types::{MailAccount, MailProviderKind, MerchantId, StoreCredentials};
use rusqlite::{OptionalExtension, params};
use secrecy::{ExposeSecret, SecretString};

use crate::database::{Database, map_tr_err};
use crate::models::{decode_enum, decode_opt_ts, encode_ts};

pub async fn mail_account(
    db: &Database,
    merchant: &MerchantId,
    provider: MailProviderKind,
) -> Result<Option<MailAccount>, DraftlineError> {
    let merchant_id = merchant.0.clone();
    let owner = merchant.clone();
    let row = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                "SELECT email_address, access_token, refresh_token, expires_at
                 FROM mail_accounts WHERE merchant_id = ?1 AND provider = ?2",
                params![merchant_id, provider.as_str()],
                |row| {
                    let email: String = row.get(0)?;
                    let access: Option<String> = row.get(1)?;
                    let refresh: Option<String> = row.get(2)?;
                    let expires_at = decode_opt_ts(3, row.get(3)?)?;
                    Ok((email, access, refresh, expires_at))
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    Ok(row.map(|(email_address, access, refresh, expires_at)| MailAccount {
        merchant_id: owner,
        provider,
        email_address,
        access_token: access.map(SecretString::from),
        refresh_token: refresh.map(SecretString::from),
        expires_at,
    }))
}

pub async fn linked_providers(
    db: &Database,
    merchant: &MerchantId,
) -> Result<Vec<MailProviderKind>, DraftlineError> {
    let merchant_id = merchant.0.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT provider FROM mail_accounts WHERE merchant_id = ?1 ORDER BY provider ASC",
            )?;
            let rows = stmt.query_map(params![merchant_id], |row| {
                let raw: String = row.get(0)?;
                decode_enum(0, &raw)
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Create or replace a linked mailbox.
pub async fn upsert_mail_account(db: &Database, account: &MailAccount) -> Result<(), DraftlineError> {
    let merchant_id = account.merchant_id.0.clone();
    let provider = account.provider;
    let email = account.email_address.clone();
    let access = account.access_token.as_ref().map(|s| s.expose_secret().to_string());
    let refresh = account.refresh_token.as_ref().map(|s| s.expose_secret().to_string());
    let expires_at = account.expires_at.map(encode_ts);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO mail_accounts (merchant_id, provider, email_address, access_token,
                                            refresh_token, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (merchant_id, provider) DO UPDATE SET
                     email_address = excluded.email_address,
                     access_token = excluded.access_token,
                     refresh_token = excluded.refresh_token,
                     expires_at = excluded.expires_at,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![merchant_id, provider.as_str(), email, access, refresh, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Persist a refreshed token. The refresh token is only replaced when the
/// provider rotated it.
pub async fn update_tokens(
    db: &Database,
    merchant: &MerchantId,
    provider: MailProviderKind,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Result<(), DraftlineError> {
    let merchant_id = merchant.0.clone();
    let access = access_token.to_string();
    let refresh = refresh_token.map(str::to_string);
    let expires_at = encode_ts(expires_at);
    let updated = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE mail_accounts SET
                     access_token = ?3,
                     refresh_token = COALESCE(?4, refresh_token),
                     expires_at = ?5,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE merchant_id = ?1 AND provider = ?2",
                params![merchant_id, provider.as_str(), access, refresh, expires_at],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(DraftlineError::NotFound(format!(
            "{} account for merchant {merchant}",
            provider.as_str()
        )));
    }
    Ok(())
}

pub async fn store_credentials(
    db: &Database,
    merchant: &MerchantId,
) -> Result<Option<StoreCredentials>, DraftlineError> {
    let merchant_id = merchant.0.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                "SELECT shop_domain, access_token FROM store_credentials WHERE merchant_id = ?1",
                params![merchant_id],
                |row| {
                    let token: String = row.get(1)?;
                    Ok(StoreCredentials {
                        shop_domain: row.get(0)?,
                        access_token: SecretString::from(token),
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_store_credentials(
    db: &Database,
    merchant: &MerchantId,
    creds: &StoreCredentials,
) -> Result<(), DraftlineError> {
    let merchant_id = merchant.0.clone();
    let domain = creds.shop_domain.clone();
    let token = creds.access_token.expose_secret().to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO store_credentials (merchant_id, shop_domain, access_token)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (merchant_id) DO UPDATE SET
                     shop_domain = excluded.shop_domain,
                     access_token = excluded.access_token,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![merchant_id, domain, token],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
