// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracked drafts.

use draftline_core::DraftlineError;
use draftline_core::types::{DraftStatus, MailProviderKind, MerchantId, TrackedDraft};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::{decode_enum, decode_ts, encode_ts};

const COLUMNS: &str =
    "id, merchant_id, provider, message_id, provider_draft_id, thread_id, created_at, status";

fn from_row(row: &Row<'_>) -> rusqlite::Result<TrackedDraft> {
    let provider: String = row.get(2)?;
    let created_at: String = row.get(6)?;
    let status: String = row.get(7)?;
    Ok(TrackedDraft {
        id: row.get(0)?,
        merchant_id: MerchantId(row.get(1)?),
        provider: decode_enum(2, &provider)?,
        message_id: row.get(3)?,
        provider_draft_id: row.get(4)?,
        thread_id: row.get(5)?,
        created_at: decode_ts(6, &created_at)?,
        status: decode_enum(7, &status)?,
    })
}

/// Insert a draft record. A second record for the same inbound message is ignored.
pub async fn insert(db: &Database, draft: &TrackedDraft) -> Result<(), DraftlineError> {
    let draft = draft.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO drafts (id, merchant_id, provider, message_id, provider_draft_id,
                                     thread_id, created_at, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (merchant_id, provider, message_id) DO NOTHING",
                params![
                    draft.id,
                    draft.merchant_id.0,
                    draft.provider.as_str(),
                    draft.message_id,
                    draft.provider_draft_id,
                    draft.thread_id,
                    encode_ts(draft.created_at),
                    draft.status.to_string(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn for_message(
    db: &Database,
    merchant: &MerchantId,
    provider: MailProviderKind,
    message_id: &str,
) -> Result<Option<TrackedDraft>, DraftlineError> {
    let merchant_id = merchant.0.clone();
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM drafts
                     WHERE merchant_id = ?1 AND provider = ?2 AND message_id = ?3"
                ),
                params![merchant_id, provider.as_str(), message_id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Pending drafts for a pair, oldest first.
pub async fn pending(
    db: &Database,
    merchant: &MerchantId,
    provider: MailProviderKind,
) -> Result<Vec<TrackedDraft>, DraftlineError> {
    let merchant_id = merchant.0.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM drafts
                 WHERE merchant_id = ?1 AND provider = ?2 AND status = 'pending'
                 ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map(params![merchant_id, provider.as_str()], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_status(db: &Database, id: &str, status: DraftStatus) -> Result<(), DraftlineError> {
    let id = id.to_string();
    let updated = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE drafts SET status = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status.to_string(), id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(DraftlineError::NotFound("draft".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn draft(id: &str, message_id: &str, minutes: i64) -> TrackedDraft {
        TrackedDraft {
            id: id.into(),
            merchant_id: MerchantId("m1".into()),
            provider: MailProviderKind::Gmail,
            message_id: message_id.into(),
            provider_draft_id: format!("r-{id}"),
            thread_id: format!("t-{message_id}"),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minutes),
            status: DraftStatus::Pending,
        }
    }

    #[tokio::test]
    async fn records_and_finds_draft_by_message() {
        let db = Database::open_in_memory().await.unwrap();
        insert(&db, &draft("d1", "msg-1", 0)).await.unwrap();

        let found = for_message(&db, &MerchantId("m1".into()), MailProviderKind::Gmail, "msg-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, draft("d1", "msg-1", 0));

        let missing = for_message(&db, &MerchantId("m1".into()), MailProviderKind::Outlook, "msg-1")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn duplicate_message_keeps_first_draft() {
        let db = Database::open_in_memory().await.unwrap();
        insert(&db, &draft("d1", "msg-1", 0)).await.unwrap();
        insert(&db, &draft("d2", "msg-1", 5)).await.unwrap();

        let found = for_message(&db, &MerchantId("m1".into()), MailProviderKind::Gmail, "msg-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "d1");
    }

    #[tokio::test]
    async fn sent_drafts_leave_pending_list() {
        let db = Database::open_in_memory().await.unwrap();
        insert(&db, &draft("d2", "msg-2", 10)).await.unwrap();
        insert(&db, &draft("d1", "msg-1", 0)).await.unwrap();

        let merchant = MerchantId("m1".into());
        let pending_ids: Vec<String> = pending(&db, &merchant, MailProviderKind::Gmail)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(pending_ids, vec!["d1", "d2"]);

        set_status(&db, "d1", DraftStatus::Sent).await.unwrap();
        let remaining = pending(&db, &merchant, MailProviderKind::Gmail).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "d2");

        assert!(matches!(
            set_status(&db, "nope", DraftStatus::Sent).await,
            Err(DraftlineError::NotFound(_))
        ));
    }
}
