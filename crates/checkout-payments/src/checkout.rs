//! Checkout Flow
//!
//! Subscribe a new customer and, for one-off purchases, schedule every
//! resulting subscription to end at the current billing period.

use crate::client::{Customer, StripeClient, SubscribeParams, Subscription};
use crate::error::{PaymentError, Result};

/// A single checkout submission
#[derive(Clone)]
pub struct CheckoutRequest {
    /// Publishable key the token was created with (multi-tenant mode)
    pub pubkey: Option<String>,

    /// Card token from Stripe Checkout / Elements
    pub token: String,

    /// Customer email
    pub email: String,

    /// Stripe plan ID
    pub plan: String,

    /// How many of the plan to subscribe to
    pub quantity: u64,

    /// Cancel the subscription at period end right after subscribing
    pub once: bool,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<()> {
        let required = [("token", &self.token), ("email", &self.email), ("plan", &self.plan)];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(PaymentError::InvalidRequest(format!("{field} is required")));
            }
        }

        if self.quantity == 0 {
            return Err(PaymentError::InvalidRequest("quantity must be at least 1".into()));
        }

        Ok(())
    }

    fn into_params(self) -> (SubscribeParams, bool) {
        let once = self.once;
        let params = SubscribeParams {
            email: self.email,
            plan: self.plan,
            token: self.token,
            quantity: self.quantity,
        };
        (params, once)
    }
}

impl std::fmt::Debug for CheckoutRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutRequest")
            .field("pubkey", &self.pubkey)
            .field("token", &redact_token(&self.token))
            .field("email", &self.email)
            .field("plan", &self.plan)
            .field("quantity", &self.quantity)
            .field("once", &self.once)
            .finish()
    }
}

/// Longest type prefix kept in front of the ellipsis, e.g. `tok_` or `card_`
const MAX_PREFIX_CHARS: usize = 5;
const TAIL_CHARS: usize = 4;
/// Characters that are always hidden
const MIN_HIDDEN_CHARS: usize = 4;

/// Keep a short type prefix and the last four characters, e.g. `tok_…4242`
pub fn redact_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < TAIL_CHARS + MIN_HIDDEN_CHARS + 1 {
        return "…".into();
    }

    let prefix_len = chars
        .iter()
        .position(|&c| c == '_')
        .map(|idx| idx + 1)
        .filter(|&len| len <= MAX_PREFIX_CHARS)
        .filter(|&len| len + MIN_HIDDEN_CHARS + TAIL_CHARS <= chars.len())
        .unwrap_or(0);

    let prefix: String = chars[..prefix_len].iter().collect();
    let tail: String = chars[chars.len() - TAIL_CHARS..].iter().collect();
    format!("{prefix}…{tail}")
}

/// Result of a completed checkout
#[derive(Clone, Debug)]
pub struct CheckoutOutcome {
    pub customer: Customer,

    /// Subscriptions scheduled to end at period end (only when `once` was set)
    pub cancelled: Vec<Subscription>,
}

impl StripeClient {
    /// Run one checkout. The request is consumed; nothing is retried.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutOutcome> {
        request.validate()?;
        let (params, once) = request.into_params();

        let customer = self.subscribe(&params).await?;
        tracing::debug!(customer_id = %customer.id, "Customer subscribed");

        let mut cancelled = Vec::new();
        if once {
            if customer.subscriptions.is_none() {
                tracing::warn!(
                    customer_id = %customer.id,
                    "No subscription list on customer; nothing to cancel"
                );
            }
            for subscription_id in customer.subscription_ids() {
                let subscription = self
                    .cancel_subscription(&customer.id, subscription_id, true)
                    .await
                    .map_err(|e| PaymentError::Cancellation {
                        customer_id: customer.id.clone(),
                        subscription_id: subscription_id.to_string(),
                        source: Box::new(e),
                    })?;
                cancelled.push(subscription);
            }
        }

        Ok(CheckoutOutcome { customer, cancelled })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StripeConfig;
    use secrecy::SecretString;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(once: bool) -> CheckoutRequest {
        CheckoutRequest {
            pubkey: None,
            token: "tok_1234567890abcd".into(),
            email: "user@example.com".into(),
            plan: "gold".into(),
            quantity: 1,
            once,
        }
    }

    fn client_for(server: &MockServer) -> StripeClient {
        let config = StripeConfig::new(server.uri(), Duration::from_secs(5));
        StripeClient::new(config, &SecretString::new("sk_test_123".into())).unwrap()
    }

    async fn mount_customer_with_two_subs(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/customers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cus_1",
                "subscriptions": {"object": "list", "data": [{"id": "sub_a"}, {"id": "sub_b"}]}
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_validate_requires_fields() {
        let mut req = request(false);
        req.email = "".into();
        assert!(matches!(req.validate(), Err(PaymentError::InvalidRequest(_))));

        let mut req = request(false);
        req.quantity = 0;
        assert!(req.validate().is_err());

        assert!(request(false).validate().is_ok());
    }

    #[test]
    fn test_redact_token() {
        assert_eq!(redact_token("tok_1234567890abcd"), "tok_…abcd");
        assert_eq!(redact_token("abcdefghijkl"), "…ijkl");
        assert_eq!(redact_token("tok_1"), "…");
        assert_eq!(redact_token("abcdefgh_xyz1"), "…xyz1");
        assert_eq!(redact_token("card_abcd1234"), "card_…1234");
        assert_eq!(redact_token("tok_abc12"), "…bc12");

        for token in ["abcdefgh_xyz1", "tok_1234567890abcd", "card_abcd1234", "x_y_z_1234567"] {
            let redacted = redact_token(token);
            let visible = redacted.chars().filter(|&c| c != '…').count();
            assert!(
                visible + MIN_HIDDEN_CHARS <= token.chars().count(),
                "too much of {token} visible: {redacted}"
            );
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let printed = format!("{:?}", request(false));
        assert!(printed.contains("tok_…abcd"));
        assert!(!printed.contains("tok_1234567890abcd"));
    }

    #[tokio::test]
    async fn test_once_cancels_every_subscription_at_period_end() {
        let server = MockServer::start().await;
        mount_customer_with_two_subs(&server).await;

        for id in ["sub_a", "sub_b"] {
            Mock::given(method("POST"))
                .and(path(format!("/subscriptions/{id}")))
                .and(body_string_contains("cancel_at_period_end=true"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "id": id,
                    "customer": "cus_1",
                    "cancel_at_period_end": true
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let outcome = client_for(&server).checkout(request(true)).await.unwrap();

        assert_eq!(outcome.customer.id, "cus_1");
        let ids: Vec<&str> = outcome.cancelled.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["sub_a", "sub_b"]);
    }

    #[tokio::test]
    async fn test_without_once_no_cancel_calls() {
        let server = MockServer::start().await;
        mount_customer_with_two_subs(&server).await;
        Mock::given(path("/subscriptions/sub_a"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = client_for(&server).checkout(request(false)).await.unwrap();
        assert!(outcome.cancelled.is_empty());
    }

    #[tokio::test]
    async fn test_once_without_subscription_list_cancels_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/customers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cus_2"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path_regex("^/subscriptions/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = client_for(&server).checkout(request(true)).await.unwrap();

        assert_eq!(outcome.customer.id, "cus_2");
        assert!(outcome.cancelled.is_empty());
    }

    #[tokio::test]
    async fn test_failed_cancel_fails_checkout() {
        let server = MockServer::start().await;
        mount_customer_with_two_subs(&server).await;

        Mock::given(method("POST"))
            .and(path("/subscriptions/sub_a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sub_a"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/subscriptions/sub_b"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "type": "invalid_request_error",
                    "message": "No such subscription: sub_b",
                    "param": "id"
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).checkout(request(true)).await.unwrap_err();

        match err {
            PaymentError::Cancellation { customer_id, subscription_id, .. } => {
                assert_eq!(customer_id, "cus_1");
                assert_eq!(subscription_id, "sub_b");
            }
            other => panic!("Expected cancellation error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_request_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut req = request(false);
        req.plan = "".into();

        let err = client_for(&server).checkout(req).await.unwrap_err();
        assert_eq!(err.category(), "invalid_request");
    }
}
