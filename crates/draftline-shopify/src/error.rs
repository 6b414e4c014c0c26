// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use draftline_core::DraftlineError;
use thiserror::Error;

/// Failures talking to the Shopify Admin API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The API answered with a non-2xx status.
    #[error("shopify returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("shopify request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected shopify response: {0}")]
    Decode(String),

    #[error("invalid shop domain: {0}")]
    InvalidDomain(String),
}

impl CommerceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<CommerceError> for DraftlineError {
    fn from(err: CommerceError) -> Self {
        let status = err.status();
        match err {
            CommerceError::InvalidDomain(domain) => {
                DraftlineError::Validation(format!("invalid shop domain: {domain}"))
            }
            _ if matches!(status, Some(401 | 403)) => DraftlineError::Permission(err.to_string()),
            other => DraftlineError::Commerce {
                message: other.to_string(),
                status,
                source: Some(Box::new(other)),
            },
        }
    }
}
