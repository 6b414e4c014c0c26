// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product catalog context: embed the message, search the index, render.

use draftline_core::types::{EmbeddingInput, MerchantId, ProductMatch};
use draftline_core::{DraftlineError, EmbeddingAdapter, ProductIndex};

/// Characters of product description shown to the model.
const DETAILS_CHARS: usize = 200;

/// Search text for a message: its body, or the subject when the body is blank.
pub fn query_text<'a>(subject: &'a str, body: &'a str) -> Option<&'a str> {
    [body.trim(), subject.trim()].into_iter().find(|s| !s.is_empty())
}

pub(crate) async fn find_products(
    embedder: &dyn EmbeddingAdapter,
    index: &dyn ProductIndex,
    merchant: &MerchantId,
    text: &str,
    top_k: usize,
    min_score: f32,
) -> Result<Vec<ProductMatch>, DraftlineError> {
    let output = embedder
        .embed(EmbeddingInput {
            texts: vec![text.to_string()],
        })
        .await?;
    let Some(embedding) = output.embeddings.into_iter().next() else {
        return Err(DraftlineError::provider("embedding response was empty"));
    };
    index.search(merchant, &embedding, top_k, min_score).await
}

/// `Product: <title> | Price: <price> | Details: <description>` per match.
pub fn render_products(matches: &[ProductMatch]) -> String {
    matches
        .iter()
        .map(|m| {
            let details: String = m.product.description.trim().chars().take(DETAILS_CHARS).collect();
            format!(
                "Product: {} | Price: {} | Details: {}",
                m.product.title.trim(),
                m.product.price.as_deref().unwrap_or("n/a"),
                details
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
