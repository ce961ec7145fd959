//! Stripe REST Client
//!
//! Thin binding over the two Stripe calls this service needs: create a
//! customer subscribed to a plan, and cancel a subscription.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{ErrorEnvelope, PaymentError, Result};

pub const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Connection settings shared by every tenant
#[derive(Clone, Debug)]
pub struct StripeConfig {
    /// API base URL, without trailing slash
    pub base_url: String,

    /// Per-request timeout for outbound calls
    pub timeout: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            base_url: STRIPE_API_BASE.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl StripeConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

/// Shared connection pool; hands out one [`StripeClient`] per secret key
#[derive(Clone, Debug)]
pub struct StripeApi {
    http: reqwest::Client,
    base_url: Arc<str>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').into(),
        })
    }

    /// Bind a secret key
    pub fn client(&self, secret_key: &SecretString) -> StripeClient {
        StripeClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            secret_key: SecretString::new(secret_key.expose_secret().clone()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Stripe client bound to a single secret key
pub struct StripeClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    secret_key: SecretString,
}

impl StripeClient {
    /// Create a standalone client with its own connection pool
    pub fn new(config: StripeConfig, secret_key: &SecretString) -> Result<Self> {
        Ok(StripeApi::new(config)?.client(secret_key))
    }

    /// Create a customer with a payment source, subscribed to a plan
    #[instrument(skip(self, params), fields(plan = %params.plan, quantity = params.quantity))]
    pub async fn subscribe(&self, params: &SubscribeParams) -> Result<Customer> {
        debug!(email = %params.email, "Creating Stripe customer");

        let quantity = params.quantity.to_string();
        let form = [
            ("email", params.email.as_str()),
            ("source", params.token.as_str()),
            ("plan", params.plan.as_str()),
            ("quantity", quantity.as_str()),
            ("expand[]", "subscriptions"),
        ];

        self.send(Method::POST, "/customers", Some(&form)).await
    }

    /// Cancel a subscription, either at the end of the billing period or now
    #[instrument(skip(self))]
    pub async fn cancel_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
        at_period_end: bool,
    ) -> Result<Subscription> {
        let endpoint = format!("/subscriptions/{subscription_id}");

        if at_period_end {
            let form = [("cancel_at_period_end", "true")];
            self.send(Method::POST, &endpoint, Some(&form)).await
        } else {
            self.send(Method::DELETE, &endpoint, None).await
        }
    }

    /// Make an authenticated request and decode the response
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<T> {
        let url = format!("{}{endpoint}", self.base_url);

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(self.secret_key.expose_secret());

        if let Some(form_data) = form {
            request = request.form(form_data);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.as_u16() >= 400 {
            return Err(decode_error(status, &body));
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

fn decode_error(status: StatusCode, body: &[u8]) -> PaymentError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let mut error = envelope.error;
            error.status = status.as_u16();
            PaymentError::Provider(error)
        }
        Err(e) => {
            warn!(status = %status, "Unreadable Stripe error body");
            PaymentError::Decode(e)
        }
    }
}

/// Parameters for [`StripeClient::subscribe`]
#[derive(Clone, Debug)]
pub struct SubscribeParams {
    pub email: String,
    pub plan: String,
    pub token: String,
    pub quantity: u64,
}

/// Stripe list envelope
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

/// Customer returned by Stripe
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    /// Requested with `expand[]=subscriptions` on creation
    #[serde(default)]
    pub subscriptions: Option<StripeList<Subscription>>,
}

impl Customer {
    pub fn subscription_ids(&self) -> impl Iterator<Item = &str> {
        self.subscriptions
            .iter()
            .flat_map(|list| list.data.iter())
            .map(|sub| sub.id.as_str())
    }
}

/// Subscription returned by Stripe
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,

    #[serde(default)]
    pub customer: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub cancel_at_period_end: bool,
}
