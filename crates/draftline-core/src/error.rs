// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Draftline pipeline.

use thiserror::Error;

/// The primary error type used across all Draftline adapter traits and pipeline stages.
///
/// Rejections (classifier rejects, permission-denied actions) are *not*
/// errors and never travel through this type; they are reported as normal
/// outcomes carrying a reason code.
#[derive(Debug, Error)]
pub enum DraftlineError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Mail provider errors (listing, fetching, draft creation).
    ///
    /// `status` carries the provider HTTP status when one was received.
    #[error("mail provider error: {message}")]
    Mail {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Missing or unrefreshable credentials. Never retried automatically.
    #[error("permission error: {0}")]
    Permission(String),

    /// Language model provider errors (API failure, bad response, misconfiguration).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Commerce platform errors (order read/write).
    #[error("commerce error: {message}")]
    Commerce {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced entity (merchant, message, draft) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller supplied an invalid request.
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DraftlineError {
    /// Shorthand for a mail error without an upstream status.
    pub fn mail(message: impl Into<String>) -> Self {
        Self::Mail {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Shorthand for a provider error without a source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Whether re-polling later could plausibly succeed.
    ///
    /// Permission, validation and not-found errors are terminal until a human
    /// changes something; upstream 5xx/429, timeouts and storage hiccups are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Mail { status, .. } | Self::Commerce { status, .. } => match status {
                Some(code) => *code == 429 || *code >= 500,
                None => true,
            },
            Self::Provider { .. } | Self::Storage { .. } | Self::Timeout { .. } => true,
            Self::Config(_)
            | Self::Permission(_)
            | Self::NotFound(_)
            | Self::Validation(_)
            | Self::Internal(_) => false,
        }
    }

    /// HTTP status the gateway reports for this failure kind.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Permission(_) => 403,
            Self::NotFound(_) => 404,
            Self::Mail { .. } | Self::Commerce { .. } | Self::Provider { .. } => 502,
            Self::Timeout { .. } => 504,
            Self::Config(_) | Self::Storage { .. } | Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_5xx_is_transient() {
        let err = DraftlineError::Mail {
            message: "boom".into(),
            status: Some(503),
            source: None,
        };
        assert!(err.is_transient());
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn upstream_4xx_is_not_transient() {
        let err = DraftlineError::Commerce {
            message: "bad".into(),
            status: Some(422),
            source: None,
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn permission_maps_to_403_and_is_terminal() {
        let err = DraftlineError::Permission("refresh token revoked".into());
        assert!(!err.is_transient());
        assert_eq!(err.http_status(), 403);
    }

    #[test]
    fn validation_maps_to_400() {
        assert_eq!(DraftlineError::Validation("x".into()).http_status(), 400);
        assert_eq!(DraftlineError::NotFound("x".into()).http_status(), 404);
    }
}
