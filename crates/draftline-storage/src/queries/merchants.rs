// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merchant identity and per-merchant configuration rows.

use draftline_core::DraftlineError;
use draftline_core::types::{AutomationSettings, Merchant, MerchantId, Persona, PolicyDocuments};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Register a merchant (no-op if the external id is already known) and
/// return its record.
pub async fn upsert(db: &Database, id: &MerchantId, external_id: &str) -> Result<Merchant, DraftlineError> {
    let id = id.0.clone();
    let external_id = external_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO merchants (id, external_id) VALUES (?1, ?2)
                 ON CONFLICT (external_id) DO NOTHING",
                params![id, external_id],
            )?;
            conn.query_row(
                "SELECT id, external_id FROM merchants WHERE external_id = ?1",
                params![external_id],
                |row| {
                    Ok(Merchant {
                        id: MerchantId(row.get(0)?),
                        external_id: row.get(1)?,
                    })
                },
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn by_external_id(db: &Database, external_id: &str) -> Result<Option<Merchant>, DraftlineError> {
    let external_id = external_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                "SELECT id, external_id FROM merchants WHERE external_id = ?1",
                params![external_id],
                |row| {
                    Ok(Merchant {
                        id: MerchantId(row.get(0)?),
                        external_id: row.get(1)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Merchants whose master auto-draft flag is on, oldest first.
pub async fn eligible(db: &Database, limit: Option<usize>) -> Result<Vec<Merchant>, DraftlineError> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.external_id FROM merchants m
                 JOIN automation_settings a ON a.merchant_id = m.id
                 WHERE a.auto_draft_enabled = 1
                 ORDER BY m.created_at ASC, m.id ASC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(Merchant {
                    id: MerchantId(row.get(0)?),
                    external_id: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn persona(db: &Database, merchant: &MerchantId) -> Result<Option<Persona>, DraftlineError> {
    let merchant_id = merchant.0.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                "SELECT signature, tone_instructions, example_scenario
                 FROM merchant_personas WHERE merchant_id = ?1",
                params![merchant_id],
                |row| {
                    Ok(Persona {
                        signature: row.get(0)?,
                        tone_instructions: row.get(1)?,
                        example_scenario: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_persona(db: &Database, merchant: &MerchantId, persona: &Persona) -> Result<(), DraftlineError> {
    let merchant_id = merchant.0.clone();
    let persona = persona.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO merchant_personas (merchant_id, signature, tone_instructions, example_scenario)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (merchant_id) DO UPDATE SET
                     signature = excluded.signature,
                     tone_instructions = excluded.tone_instructions,
                     example_scenario = excluded.example_scenario",
                params![
                    merchant_id,
                    persona.signature,
                    persona.tone_instructions,
                    persona.example_scenario
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn automation(
    db: &Database,
    merchant: &MerchantId,
) -> Result<Option<AutomationSettings>, DraftlineError> {
    let merchant_id = merchant.0.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                "SELECT order_updates, cancel_orders, auto_refunds, use_history_as_training,
                        auto_draft_enabled
                 FROM automation_settings WHERE merchant_id = ?1",
                params![merchant_id],
                |row| {
                    Ok(AutomationSettings {
                        order_updates: row.get(0)?,
                        cancel_orders: row.get(1)?,
                        auto_refunds: row.get(2)?,
                        use_history_as_training: row.get(3)?,
                        auto_draft_enabled: row.get(4)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_automation(
    db: &Database,
    merchant: &MerchantId,
    settings: AutomationSettings,
) -> Result<(), DraftlineError> {
    let merchant_id = merchant.0.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO automation_settings (merchant_id, order_updates, cancel_orders,
                     auto_refunds, use_history_as_training, auto_draft_enabled)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (merchant_id) DO UPDATE SET
                     order_updates = excluded.order_updates,
                     cancel_orders = excluded.cancel_orders,
                     auto_refunds = excluded.auto_refunds,
                     use_history_as_training = excluded.use_history_as_training,
                     auto_draft_enabled = excluded.auto_draft_enabled",
                params![
                    merchant_id,
                    settings.order_updates,
                    settings.cancel_orders,
                    settings.auto_refunds,
                    settings.use_history_as_training,
                    settings.auto_draft_enabled,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn policies(
    db: &Database,
    merchant: &MerchantId,
) -> Result<Option<PolicyDocuments>, DraftlineError> {
    let merchant_id = merchant.0.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.query_row(
                "SELECT refund, shipping, terms, tone_notes
                 FROM policy_documents WHERE merchant_id = ?1",
                params![merchant_id],
                |row| {
                    Ok(PolicyDocuments {
                        refund: row.get(0)?,
                        shipping: row.get(1)?,
                        terms: row.get(2)?,
                        tone_notes: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_policies(
    db: &Database,
    merchant: &MerchantId,
    docs: &PolicyDocuments,
) -> Result<(), DraftlineError> {
    let merchant_id = merchant.0.clone();
    let docs = docs.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO policy_documents (merchant_id, refund, shipping, terms, tone_notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (merchant_id) DO UPDATE SET
                     refund = excluded.refund,
                     shipping = excluded.shipping,
                     terms = excluded.terms,
                     tone_notes = excluded.tone_notes",
                params![merchant_id, docs.refund, docs.shipping, docs.terms, docs.tone_notes],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
