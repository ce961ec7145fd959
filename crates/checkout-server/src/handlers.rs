//! HTTP Handlers

use axum::{
    body::Bytes,
    extract::{Form, FromRequest, Request, State},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::Instrument;

use checkout_payments::{CheckoutOutcome, CheckoutRequest, PaymentError, redact_token};

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// How the checkout was submitted; decides how the result is rendered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionFormat {
    /// `fetch` from the checkout page; answered with `OK` or an error body
    Json,
    /// Plain HTML form post; answered with a redirect
    Form,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JsonSubmission {
    #[serde(default, alias = "pubkey")]
    pub pubkey: Option<String>,
    #[serde(alias = "token")]
    pub token: String,
    #[serde(alias = "email")]
    pub email: String,
    #[serde(alias = "plan")]
    pub plan: String,
    #[serde(default = "default_quantity", alias = "quantity")]
    pub quantity: u64,
    #[serde(default, alias = "once")]
    pub once: bool,
}

/// Field names posted by Stripe Checkout's legacy form integration
#[derive(Debug, Deserialize)]
pub struct FormSubmission {
    #[serde(rename = "stripeEmail")]
    pub email: String,
    #[serde(rename = "stripeToken")]
    pub token: String,
    #[serde(rename = "stripePlan")]
    pub plan: String,
    #[serde(rename = "stripeQuantity", default = "default_quantity")]
    pub quantity: u64,
    #[serde(default)]
    pub pubkey: Option<String>,
}

fn default_quantity() -> u64 {
    1
}

impl From<JsonSubmission> for CheckoutRequest {
    fn from(s: JsonSubmission) -> Self {
        Self {
            pubkey: s.pubkey,
            token: s.token,
            email: s.email,
            plan: s.plan,
            quantity: s.quantity,
            once: s.once,
        }
    }
}

impl From<FormSubmission> for CheckoutRequest {
    fn from(s: FormSubmission) -> Self {
        Self {
            pubkey: s.pubkey,
            token: s.token,
            email: s.email,
            plan: s.plan,
            quantity: s.quantity,
            once: false,
        }
    }
}

/// A parsed checkout body, form-encoded or JSON
pub struct Submission {
    pub request: CheckoutRequest,
    pub format: SubmissionFormat,
}

impl<S: Send + Sync> FromRequest<S> for Submission {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(form) = Form::<FormSubmission>::from_request(req, state)
                .await
                .map_err(|e| bad_request(e.body_text()))?;
            return Ok(Self {
                request: form.into(),
                format: SubmissionFormat::Form,
            });
        }

        // Anything that is not a form is read as JSON, whatever its content type
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        let json: JsonSubmission =
            serde_json::from_slice(&body).map_err(|e| bad_request(e.to_string()))?;

        Ok(Self {
            request: json.into(),
            format: SubmissionFormat::Json,
        })
    }
}

fn bad_request(reason: String) -> ApiError {
    tracing::warn!(reason = %reason, "Rejected checkout body");
    ApiError::BadRequest(reason)
}

// ============================================================================
// Handlers
// ============================================================================

/// Create the customer and subscription for one checkout
pub async fn checkout(State(state): State<AppState>, submission: Submission) -> Response {
    let Submission { request, format } = submission;
    let span = tracing::info_span!(
        "checkout",
        request_id = %uuid::Uuid::new_v4(),
        format = ?format
    );

    async move {
        match process(&state, request).await {
            Ok(outcome) => {
                if state.dev {
                    tracing::info!(
                        customer_id = %outcome.customer.id,
                        cancelled = outcome.cancelled.len(),
                        "Checkout completed"
                    );
                }
                match format {
                    SubmissionFormat::Json => (StatusCode::OK, "OK").into_response(),
                    SubmissionFormat::Form => Redirect::to(&state.pages.success).into_response(),
                }
            }
            Err(ApiError::Payment(_)) if format == SubmissionFormat::Form => {
                Redirect::to(&state.pages.failure).into_response()
            }
            Err(e) => e.into_response(),
        }
    }
    .instrument(span)
    .await
}

async fn process(state: &AppState, request: CheckoutRequest) -> Result<CheckoutOutcome, ApiError> {
    if state.dev {
        tracing::debug!(request = ?request, "Checkout request");
    }

    request.validate().map_err(|e| bad_request(e.to_string()))?;

    let Some(secret_key) = state.keys.resolve(request.pubkey.as_deref()) else {
        tracing::warn!(pubkey = ?request.pubkey, "No secret key for account");
        return Err(ApiError::AccountNotFound);
    };

    let email = request.email.clone();
    let plan = request.plan.clone();
    let quantity = request.quantity;
    let token = redact_token(&request.token);

    state
        .stripe
        .client(secret_key)
        .checkout(request)
        .await
        .map_err(|e| {
            log_failure(&e, &email, &plan, quantity, &token);
            ApiError::Payment(e)
        })
}

fn log_failure(error: &PaymentError, email: &str, plan: &str, quantity: u64, token: &str) {
    match error.provider_error() {
        Some(provider) => tracing::error!(
            email = %email,
            plan = %plan,
            quantity,
            token = %token,
            category = error.category(),
            kind = %provider.kind,
            code = ?provider.code,
            param = ?provider.param,
            provider_message = %provider.message,
            "Failed to subscribe"
        ),
        None => tracing::error!(
            email = %email,
            plan = %plan,
            quantity,
            token = %token,
            category = error.category(),
            error = %error,
            "Failed to subscribe"
        ),
    }
}

/// CORS preflight; the CORS layer adds headers in dev mode
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Method guard for routes that only accept a fixed set of methods
pub async fn method_not_allowed(method: Method) -> ApiError {
    tracing::warn!(method = %method, "Method not allowed");
    ApiError::MethodNotAllowed
}
