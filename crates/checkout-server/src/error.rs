//! Error types for the checkout endpoint.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use checkout_payments::PaymentError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Payment failed")]
    Payment(#[from] PaymentError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Payment(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Payment(_) => "SERVER_ERROR",
        }
    }

    /// Text shown to the client. Provider and transport failures look the same.
    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(_) => "bad request".into(),
            Self::AccountNotFound => "account not found".into(),
            Self::MethodNotAllowed => "method not allowed".into(),
            Self::Payment(_) => "server error".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message(),
            code: self.error_code().into(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_payments::{ProviderError, ProviderErrorKind};

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::AccountNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_payment_failures_share_public_message() {
        let provider = ApiError::from(PaymentError::Provider(ProviderError {
            kind: ProviderErrorKind::CardError,
            message: "Your card was declined.".into(),
            code: Some("card_declined".into()),
            param: None,
            decline_code: None,
            status: 402,
        }));
        let other = ApiError::from(PaymentError::InvalidRequest("plan is required".into()));

        assert_eq!(provider.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(provider.public_message(), other.public_message());
        assert_eq!(provider.error_code(), other.error_code());
    }
}
