//! Secret Key Store
//!
//! Resolves which Stripe secret key a checkout runs under: either one key
//! for the whole process, or a per-tenant table keyed by publishable key.

use std::collections::HashMap;
use std::path::Path;

use secrecy::SecretString;

use crate::error::{PaymentError, Result};

/// Read-only after construction
pub enum KeyStore {
    /// One secret key for every request; the public key is ignored
    Single(SecretString),

    /// Publishable key -> secret key
    Tenants(HashMap<String, SecretString>),
}

impl KeyStore {
    pub fn single(secret_key: impl Into<String>) -> Result<Self> {
        let secret_key = secret_key.into();
        if secret_key.trim().is_empty() {
            return Err(PaymentError::Config("secret key is empty".into()));
        }
        Ok(KeyStore::Single(SecretString::new(secret_key)))
    }

    /// Load a JSON object mapping publishable keys to secret keys
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let store = Self::from_json(&raw).map_err(|e| {
            PaymentError::Config(format!("failed to parse key file {}: {e}", path.display()))
        })?;

        tracing::info!(path = %path.display(), tenants = store.len(), "Loaded Stripe key file");
        Ok(store)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let table: HashMap<String, String> = serde_json::from_str(raw)?;
        if table.is_empty() {
            tracing::warn!("Key table is empty - every checkout will be rejected");
        }

        Ok(KeyStore::Tenants(
            table
                .into_iter()
                .map(|(public, secret)| (public, SecretString::new(secret)))
                .collect(),
        ))
    }

    /// Secret key for a checkout; `None` means the account is unknown
    pub fn resolve(&self, pubkey: Option<&str>) -> Option<&SecretString> {
        match self {
            KeyStore::Single(secret) => Some(secret),
            KeyStore::Tenants(table) => pubkey.and_then(|key| table.get(key)),
        }
    }

    pub fn is_multi_tenant(&self) -> bool {
        matches!(self, KeyStore::Tenants(_))
    }

    pub fn len(&self) -> usize {
        match self {
            KeyStore::Single(_) => 1,
            KeyStore::Tenants(table) => table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyStore::Single(_) => f.write_str("KeyStore::Single([REDACTED])"),
            KeyStore::Tenants(table) => {
                let mut keys: Vec<&str> = table.keys().map(String::as_str).collect();
                keys.sort_unstable();
                f.debug_tuple("KeyStore::Tenants").field(&keys).finish()
            }
        }
    }
}
