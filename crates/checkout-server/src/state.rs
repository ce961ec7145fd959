//! Application State

use std::sync::Arc;

use checkout_payments::{KeyStore, StripeApi};

use crate::config::{RedirectPages, ServerConfig};

/// Shared application state, read-only once built
#[derive(Clone)]
pub struct AppState {
    /// Secret key lookup (single key or per tenant)
    pub keys: Arc<KeyStore>,

    /// Stripe connection pool
    pub stripe: StripeApi,

    /// Redirect targets for form submissions
    pub pages: Arc<RedirectPages>,

    /// Development mode
    pub dev: bool,
}

impl AppState {
    pub fn new(keys: KeyStore, stripe: StripeApi, pages: RedirectPages, dev: bool) -> Self {
        Self {
            keys: Arc::new(keys),
            stripe,
            pages: Arc::new(pages),
            dev,
        }
    }

    pub fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let stripe = StripeApi::new(config.stripe)?;
        Ok(Self::new(config.keys, stripe, config.pages, config.dev))
    }
}
