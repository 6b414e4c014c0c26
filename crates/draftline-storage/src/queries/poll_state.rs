// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per (merchant, provider) polling watermark.

use draftline_core::DraftlineError;
use draftline_core::types::{MailProviderKind, MerchantId, PollState, Watermark};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{decode_opt_ts, encode_ts};

/// Load the state for a pair, or an empty state if it was never polled.
pub async fn get(
    db: &Database,
    merchant: &MerchantId,
    provider: MailProviderKind,
) -> Result<PollState, DraftlineError> {
    let merchant_id = merchant.0.clone();
    let row = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                "SELECT last_message_id, last_received_at FROM poll_state
                 WHERE merchant_id = ?1 AND provider = ?2",
                params![merchant_id, provider.as_str()],
                |row| {
                    let id: Option<String> = row.get(0)?;
                    let at = decode_opt_ts(1, row.get(1)?)?;
                    Ok((id, at))
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    let mut state = PollState::empty(merchant.clone(), provider);
    if let Some((id, at)) = row {
        state.last_message_id = id;
        state.last_received_at = at;
    }
    Ok(state)
}

/// Upsert the watermark, ignoring it when older than the stored one.
///
/// Returns whether the row changed.
pub async fn advance(
    db: &Database,
    merchant: &MerchantId,
    provider: MailProviderKind,
    watermark: &Watermark,
) -> Result<bool, DraftlineError> {
    let merchant_id = merchant.0.clone();
    let message_id = watermark.message_id.clone();
    let received_at = encode_ts(watermark.received_at);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let changed = conn.execute(
                "INSERT INTO poll_state (merchant_id, provider, last_message_id, last_received_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (merchant_id, provider) DO UPDATE SET
                     last_message_id = excluded.last_message_id,
                     last_received_at = excluded.last_received_at,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE poll_state.last_received_at IS NULL
                    OR excluded.last_received_at >= poll_state.last_received_at",
                params![merchant_id, provider.as_str(), message_id, received_at],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn mark(id: &str, hour: u32) -> Watermark {
        Watermark {
            message_id: id.into(),
            received_at: Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn unknown_pair_is_empty() {
        let db = Database::open_in_memory().await.unwrap();
        let state = get(&db, &MerchantId("m1".into()), MailProviderKind::Gmail)
            .await
            .unwrap();
        assert!(state.watermark().is_none());
    }

    #[tokio::test]
    async fn watermark_never_moves_backwards() {
        let db = Database::open_in_memory().await.unwrap();
        let merchant = MerchantId("m1".into());

        assert!(advance(&db, &merchant, MailProviderKind::Gmail, &mark("b", 10)).await.unwrap());
        assert!(!advance(&db, &merchant, MailProviderKind::Gmail, &mark("a", 9)).await.unwrap());

        let state = get(&db, &merchant, MailProviderKind::Gmail).await.unwrap();
        assert_eq!(state.watermark(), Some(mark("b", 10)));

        assert!(advance(&db, &merchant, MailProviderKind::Gmail, &mark("c", 11)).await.unwrap());
        let state = get(&db, &merchant, MailProviderKind::Gmail).await.unwrap();
        assert_eq!(state.last_message_id.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn providers_are_tracked_separately() {
        let db = Database::open_in_memory().await.unwrap();
        let merchant = MerchantId("m1".into());
        advance(&db, &merchant, MailProviderKind::Gmail, &mark("g", 10)).await.unwrap();

        let outlook = get(&db, &merchant, MailProviderKind::Outlook).await.unwrap();
        assert!(outlook.last_received_at.is_none());
    }
}
