use thiserror::Error;

/// Why a single weather lookup did not produce a usable record.
///
/// Every variant is terminal for the attempt; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The service answered with a non-2xx status and a JSON error body.
    #[error("weather service rejected the lookup with status {status}")]
    Rejected { status: u16, detail: Option<String> },

    /// The request never completed, or the body was not JSON.
    #[error("could not reach the weather service: {reason}")]
    Network { reason: String },

    /// The payload handed to the normalizer is not a weather record.
    #[error("invalid weather payload: {reason}")]
    InvalidPayload { reason: String },
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Network { reason: err.to_string() }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::InvalidPayload { reason: err.to_string() }
    }
}

/// Misuse of the form controller's state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Unknown form field '{0}'. Supported fields: ID.")]
    UnknownField(String),

    #[error("Please input an ID")]
    MissingId,

    #[error("A weather lookup is already in flight")]
    AlreadySubmitting,

    #[error("No weather lookup is in flight")]
    NotSubmitting,
}
