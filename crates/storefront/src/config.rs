//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults suit local development.
//!
//! - `BOOK_NOOK_DATABASE_URL` - `SQLite` connection string, falls back to
//!   `DATABASE_URL` (default: `sqlite://bookstore.db?mode=rwc`)
//! - `BOOK_NOOK_HOST` - Bind address (default: 127.0.0.1)
//! - `BOOK_NOOK_PORT` - Listen port (default: 3000)
//! - `BOOK_NOOK_BASE_URL` - Public URL; `https://` enables secure cookies
//!   (default: `http://127.0.0.1:3000`)
//! - `ADMIN_PASSWORD` - Password for the `/admin` panel (default: `admin123`)
//! - `BOOK_NOOK_TAX_RATE` - Tax as a fraction of the taxable amount (default: 0.0825)
//! - `BOOK_NOOK_SHIPPING_FLAT` - Flat shipping fee (default: 4.99)
//! - `BOOK_NOOK_FREE_SHIPPING_MIN` - Free shipping threshold (default: 25.00)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use book_nook_core::PricingConfig;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Password used when `ADMIN_PASSWORD` is not set.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

const DEFAULT_DATABASE_URL: &str = "sqlite://bookstore.db?mode=rwc";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Plain-text admin password; hashed once when `AppState` is built
    pub admin_password: SecretString,
    /// Tax and shipping settings
    pub pricing: PricingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env.database_url("BOOK_NOOK_DATABASE_URL");
        let host = env
            .or_default("BOOK_NOOK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOOK_NOOK_HOST".to_owned(), e.to_string()))?;
        let port = env
            .or_default("BOOK_NOOK_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOOK_NOOK_PORT".to_owned(), e.to_string()))?;
        let base_url = env.or_default("BOOK_NOOK_BASE_URL", &format!("http://{host}:{port}"));
        let admin_password =
            SecretString::from(env.or_default("ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD));

        let defaults = PricingConfig::default();
        let pricing = PricingConfig {
            tax_rate: env.decimal("BOOK_NOOK_TAX_RATE", defaults.tax_rate)?,
            shipping_flat: env.decimal("BOOK_NOOK_SHIPPING_FLAT", defaults.shipping_flat)?,
            free_shipping_min: env
                .decimal("BOOK_NOOK_FREE_SHIPPING_MIN", defaults.free_shipping_min)?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            admin_password,
            pricing,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the admin panel is still protected by the built-in password.
    #[must_use]
    pub fn uses_default_admin_password(&self) -> bool {
        self.admin_password.expose_secret() == DEFAULT_ADMIN_PASSWORD
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_owned())
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> SecretString {
        let url = self
            .optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
        SecretString::from(url)
    }

    /// Get a non-negative decimal.
    fn decimal(&self, key: &str, default: Decimal) -> Result<Decimal, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        let value = raw
            .trim()
            .parse::<Decimal>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                key.to_owned(),
                format!("must not be negative (got {value})"),
            ));
        }
        Ok(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal_macros::dec;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_url.expose_secret(), DEFAULT_DATABASE_URL);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert!(config.uses_default_admin_password());
        assert!(!config.is_secure());
        assert_eq!(config.pricing, PricingConfig::default());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "sqlite::memory:")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "sqlite::memory:");

        let config = load(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("BOOK_NOOK_DATABASE_URL", "sqlite://shop.db"),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "sqlite://shop.db");
    }

    #[test]
    fn test_pricing_overrides() {
        let config = load(&[
            ("BOOK_NOOK_TAX_RATE", "0.05"),
            ("BOOK_NOOK_SHIPPING_FLAT", "3"),
            ("BOOK_NOOK_FREE_SHIPPING_MIN", " 50.00 "),
        ])
        .unwrap();
        assert_eq!(config.pricing.tax_rate, dec!(0.05));
        assert_eq!(config.pricing.shipping_flat, dec!(3));
        assert_eq!(config.pricing.free_shipping_min, dec!(50.00));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            load(&[("BOOK_NOOK_PORT", "eighty")]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "BOOK_NOOK_PORT"
        ));
        assert!(matches!(
            load(&[("BOOK_NOOK_TAX_RATE", "-0.01")]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "BOOK_NOOK_TAX_RATE"
        ));
        assert!(matches!(
            load(&[("BOOK_NOOK_SHIPPING_FLAT", "free")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_https_base_url_is_secure() {
        let config = load(&[("BOOK_NOOK_BASE_URL", "https://books.example.com")]).unwrap();
        assert!(config.is_secure());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[("ADMIN_PASSWORD", "hunter2-but-longer")]).unwrap();
        assert!(!config.uses_default_admin_password());
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2-but-longer"));
        assert!(debug_output.contains("REDACTED"));
    }
}
