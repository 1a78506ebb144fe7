use serde::{Deserialize, Serialize};

/// Why an identification request did not produce a result.
/// Use code-style identifiers for all error variants for i18n compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    #[error("identification.network")]
    Network,
    #[error("identification.server_rejected")]
    ServerRejected,
    #[error("identification.rate_limited")]
    RateLimited,
    #[error("identification.malformed_response")]
    MalformedResponse,
    #[error("identification.cancelled")]
    Cancelled,
    #[error("identification.invalid_image")]
    InvalidImage,
}

impl FailureReason {
    /// Transient failures that may succeed on a later attempt.
    pub fn is_retryable_by_default(&self) -> bool {
        matches!(self, FailureReason::Network | FailureReason::RateLimited)
    }

    /// Human-readable text for clients that do not localize the error code.
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureReason::Network => {
                "Could not reach the identification service. Check your connection and try again."
            }
            FailureReason::ServerRejected => "The identification service could not process this photo.",
            FailureReason::RateLimited => {
                "The identification service is busy right now. Please try again in a moment."
            }
            FailureReason::MalformedResponse => {
                "The identification service returned an unexpected answer."
            }
            FailureReason::Cancelled => "The identification was cancelled.",
            FailureReason::InvalidImage => "This photo could not be read. Try taking another one.",
        }
    }
}

/// Validation errors raised while building identification values.
#[derive(Debug, thiserror::Error)]
pub enum IdentificationError {
    #[error("identification.name_empty")]
    NameEmpty,
    #[error("identification.confidence_out_of_range")]
    ConfidenceOutOfRange,
    #[error("identification.image_encoding")]
    ImageEncoding,
}
