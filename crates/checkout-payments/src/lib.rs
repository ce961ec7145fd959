//! # checkout-payments
//!
//! Stripe customer/subscription client for stripe-checkout.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  token   ┌──────────────────┐  POST /customers   ┌──────────┐
//! │  Checkout   │────────▶│  checkout-server  │──────────────────▶│  Stripe  │
//! │  page (JS)  │         │  (this crate)     │◀──────────────────│   API    │
//! └─────────────┘         └──────────────────┘   customer / error └──────────┘
//! ```
//!
//! The browser tokenizes the card with the publishable key and posts the
//! token here. We resolve the matching secret key, create a customer with
//! that token as its payment source, and subscribe it to the plan. One-off
//! purchases (`once`) then schedule every new subscription to end at the
//! current billing period.
//!
//! Nothing is retried: a failed call is reported once and the caller decides.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_payments::{CheckoutRequest, KeyStore, StripeApi, StripeConfig};
//!
//! let keys = KeyStore::load("/etc/stripe-keys.json")?;
//! let api = StripeApi::new(StripeConfig::default())?;
//!
//! let secret = keys.resolve(Some("pk_test_xxx")).expect("known tenant");
//! let outcome = api.client(secret).checkout(CheckoutRequest {
//!     pubkey: Some("pk_test_xxx".into()),
//!     token: "tok_visa".into(),
//!     email: "user@example.com".into(),
//!     plan: "gold".into(),
//!     quantity: 1,
//!     once: false,
//! }).await?;
//! ```

mod checkout;
mod client;
mod error;
mod keys;

pub use checkout::{CheckoutOutcome, CheckoutRequest, redact_token};
pub use client::{
    Customer, STRIPE_API_BASE, StripeApi, StripeClient, StripeConfig, StripeList,
    SubscribeParams, Subscription,
};
pub use error::{PaymentError, ProviderError, ProviderErrorKind, Result};
pub use keys::KeyStore;

pub use secrecy::SecretString;
