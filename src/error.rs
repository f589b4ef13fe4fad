//! Lookup error taxonomy.
//!
//! Every remote-dependent operation surfaces failures as a [`LookupError`]
//! so callers can distinguish authorization, configuration, validation,
//! and provider-side failures. The normalizer and label builders never
//! produce errors at all.

use axum::http::StatusCode;
use crate::kind::ObjectKind;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LookupError>;

/// Uniform failure value for lookup operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The caller lacks permission to search or fetch records.
    ///
    /// Rejected before any remote call is attempted.
    #[error("You do not have permission to perform this request")]
    Unauthorized,

    /// No Stripe credential is configured.
    ///
    /// Produced without attempting network I/O; the picker degrades to
    /// display-only behavior.
    #[error("Stripe secret key is missing")]
    NotConfigured,

    /// A required identifier was empty or malformed.
    #[error("{} ID is required", .kind.display_name())]
    MissingIdentifier { kind: ObjectKind },

    /// The provider reported that no such record exists.
    #[error("No such {kind}: {id}")]
    NotFound { kind: ObjectKind, id: String },

    /// The Stripe API rejected or failed the call.
    ///
    /// The provider's message is passed through verbatim for operator
    /// visibility. Never retried automatically.
    #[error("Stripe API error: {message}")]
    Provider { message: String },
}

impl LookupError {
    /// Shorthand for a provider failure with a message.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Whether the failure originated with the caller rather than Stripe.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized
                | Self::NotConfigured
                | Self::MissingIdentifier { .. }
                | Self::NotFound { .. }
        )
    }

    /// HTTP status used by the search endpoint for this failure.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotConfigured | Self::MissingIdentifier { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Provider { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}
