//! Payment Error Types

use serde::Deserialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe answered with an error payload
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Network failure, timeout or unreadable response
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Checkout request failed validation before any call was made
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Customer was created but one of its subscriptions could not be cancelled
    #[error("Failed to cancel subscription {subscription_id} for customer {customer_id}: {source}")]
    Cancellation {
        customer_id: String,
        subscription_id: String,
        #[source]
        source: Box<PaymentError>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PaymentError {
    /// Short label used in log lines
    pub fn category(&self) -> &'static str {
        match self {
            PaymentError::Provider(_) => "provider",
            PaymentError::Transport(_) => "transport",
            PaymentError::Decode(_) => "decode",
            PaymentError::InvalidRequest(_) => "invalid_request",
            PaymentError::Cancellation { .. } => "cancellation",
            PaymentError::Config(_) => "config",
            PaymentError::Io(_) => "io",
        }
    }

    /// The provider error behind this failure, if any
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            PaymentError::Provider(e) => Some(e),
            PaymentError::Cancellation { source, .. } => source.provider_error(),
            _ => None,
        }
    }
}

/// Error category reported by Stripe in `error.type`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    ApiConnectionError,
    ApiError,
    AuthenticationError,
    CardError,
    IdempotencyError,
    InvalidRequestError,
    RateLimitError,
    #[serde(other)]
    Unknown,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::ApiConnectionError => "api_connection_error",
            ProviderErrorKind::ApiError => "api_error",
            ProviderErrorKind::AuthenticationError => "authentication_error",
            ProviderErrorKind::CardError => "card_error",
            ProviderErrorKind::IdempotencyError => "idempotency_error",
            ProviderErrorKind::InvalidRequestError => "invalid_request_error",
            ProviderErrorKind::RateLimitError => "rate_limit_error",
            ProviderErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error payload returned by Stripe
#[derive(Error, Clone, Debug, PartialEq, Eq, Deserialize)]
#[error("Stripe error [{kind}]: {message}")]
pub struct ProviderError {
    #[serde(rename = "type")]
    pub kind: ProviderErrorKind,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub param: Option<String>,

    #[serde(default)]
    pub decline_code: Option<String>,

    /// HTTP status of the response carrying the error
    #[serde(skip)]
    pub status: u16,
}

/// Stripe wraps every error payload in `{"error": {...}}`
#[derive(Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ProviderError,
}
