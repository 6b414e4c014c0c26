// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product catalog with embeddings; similarity is computed in process.

use draftline_core::DraftlineError;
use draftline_core::types::{MerchantId, Product, ProductMatch};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{cosine_similarity, decode_embedding, encode_embedding};

pub async fn upsert(
    db: &Database,
    merchant: &MerchantId,
    product: &Product,
    embedding: &[f32],
) -> Result<(), DraftlineError> {
    let merchant_id = merchant.0.clone();
    let product = product.clone();
    let blob = encode_embedding(embedding);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO products (merchant_id, id, title, price, description, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (merchant_id, id) DO UPDATE SET
                     title = excluded.title,
                     price = excluded.price,
                     description = excluded.description,
                     embedding = excluded.embedding",
                params![
                    merchant_id,
                    product.id,
                    product.title,
                    product.price,
                    product.description,
                    blob
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Best `top_k` products scoring at least `min_score`, best first.
pub async fn search(
    db: &Database,
    merchant: &MerchantId,
    embedding: &[f32],
    top_k: usize,
    min_score: f32,
) -> Result<Vec<ProductMatch>, DraftlineError> {
    if top_k == 0 || embedding.is_empty() {
        return Ok(Vec::new());
    }
    let merchant_id = merchant.0.clone();
    let query = embedding.to_vec();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, title, price, description, embedding
                 FROM products WHERE merchant_id = ?1",
            )?;
            let rows = stmt.query_map(params![merchant_id], |row| {
                let blob: Vec<u8> = row.get(4)?;
                Ok((
                    Product {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        price: row.get(2)?,
                        description: row.get(3)?,
                    },
                    blob,
                ))
            })?;

            let mut matches = Vec::new();
            for row in rows {
                let (product, blob) = row?;
                let score = cosine_similarity(&query, &decode_embedding(&blob));
                if score >= min_score {
                    matches.push(ProductMatch { product, score });
                }
            }
            matches.sort_by(|a, b| b.score.total_cmp(&a.score));
            matches.truncate(top_k);
            Ok(matches)
        })
        .await
        .map_err(map_tr_err)
}
