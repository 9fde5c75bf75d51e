//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use book_nook_core::{PricingEngine, PromoBook};

use crate::config::StorefrontConfig;
use crate::services::auth::{AdminAuth, AuthError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: SqlitePool,
    pricing: PricingEngine,
    admin_auth: AdminAuth,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Hashes the configured admin password; the plain text is not kept
    /// anywhere else in the state.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the admin password cannot be hashed.
    pub fn new(config: StorefrontConfig, pool: SqlitePool) -> Result<Self, AuthError> {
        let admin_auth = AdminAuth::from_password(&config.admin_password)?;
        let pricing = PricingEngine::new(config.pricing, PromoBook::default());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                pricing,
                admin_auth,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the pricing engine.
    #[must_use]
    pub fn pricing(&self) -> &PricingEngine {
        &self.inner.pricing
    }

    /// Get a reference to the admin password verifier.
    #[must_use]
    pub fn admin_auth(&self) -> &AdminAuth {
        &self.inner.admin_auth
    }
}
