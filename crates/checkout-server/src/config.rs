//! Command-line and environment configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;

use checkout_payments::{KeyStore, STRIPE_API_BASE, StripeConfig};

#[derive(Parser)]
#[command(name = "checkout-server")]
#[command(version)]
#[command(about = "Stripe checkout endpoint", long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// Development mode: permissive CORS and verbose logging
    #[arg(long, env = "CHECKOUT_DEV")]
    pub dev: bool,

    /// JSON file mapping publishable keys to secret keys (multi-tenant)
    #[arg(long, env = "CHECKOUT_KEYS_FILE")]
    pub keys: Option<PathBuf>,

    /// Single secret key, used when no key file is given
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Directory holding the checkout page and result pages
    #[arg(long, env = "CHECKOUT_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Redirect target after a successful form checkout
    #[arg(long, env = "CHECKOUT_SUCCESS_PAGE", default_value = "/success.html")]
    pub success_page: String,

    /// Redirect target after a failed form checkout
    #[arg(long, env = "CHECKOUT_FAILURE_PAGE", default_value = "/failure.html")]
    pub failure_page: String,

    /// Stripe API base URL
    #[arg(long, env = "STRIPE_API_URL", default_value = STRIPE_API_BASE)]
    pub stripe_api_url: String,

    /// Timeout for each Stripe call, in seconds
    #[arg(long, env = "STRIPE_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Where form submissions are sent after checkout
#[derive(Clone, Debug)]
pub struct RedirectPages {
    pub success: String,
    pub failure: String,
}

impl Default for RedirectPages {
    fn default() -> Self {
        Self {
            success: "/success.html".into(),
            failure: "/failure.html".into(),
        }
    }
}

/// Validated server configuration
#[derive(Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub dev: bool,
    pub keys: KeyStore,
    pub static_dir: PathBuf,
    pub pages: RedirectPages,
    pub stripe: StripeConfig,
}

impl ServerConfig {
    /// The key file wins over a single secret key
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let keys = match (&cli.keys, cli.secret_key) {
            (Some(path), _) => KeyStore::load(path)
                .with_context(|| format!("failed to load key file {}", path.display()))?,
            (None, Some(secret)) => {
                KeyStore::single(secret).context("invalid STRIPE_SECRET_KEY")?
            }
            (None, None) => {
                bail!("no Stripe keys configured: pass --keys or set STRIPE_SECRET_KEY")
            }
        };

        if cli.timeout_secs == 0 {
            bail!("--timeout-secs must be greater than zero");
        }

        Ok(Self {
            addr: cli.addr,
            dev: cli.dev,
            keys,
            static_dir: cli.static_dir,
            pages: RedirectPages {
                success: cli.success_page,
                failure: cli.failure_page,
            },
            stripe: StripeConfig::new(cli.stripe_api_url, Duration::from_secs(cli.timeout_secs)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key_from_flags() {
        let cli = Cli::parse_from(["checkout-server", "--secret-key", "sk_test_1", "--dev"]);
        let config = ServerConfig::from_cli(cli).unwrap();

        assert!(config.dev);
        assert!(!config.keys.is_multi_tenant());
        assert_eq!(config.stripe.timeout, Duration::from_secs(30));
        assert_eq!(config.pages.success, "/success.html");
    }

    #[test]
    fn test_missing_key_file_is_fatal() {
        let cli = Cli::parse_from(["checkout-server", "--keys", "/nonexistent/keys.json"]);
        assert!(ServerConfig::from_cli(cli).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cli = Cli::parse_from([
            "checkout-server",
            "--secret-key",
            "sk_test_1",
            "--timeout-secs",
            "0",
        ]);
        assert!(ServerConfig::from_cli(cli).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
