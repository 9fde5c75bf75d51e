//! Session-related types.
//!
//! Everything a visitor accumulates between requests (cart, promo code,
//! last order, admin login) lives in the `tower-sessions` session under the
//! keys in [`keys`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use book_nook_core::{Cart, OrderNumber};

use crate::error::AppError;

/// Session-stored admin login marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// When the password was accepted.
    pub logged_in_at: DateTime<Utc>,
}

/// Session keys.
pub mod keys {
    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for the promo code entered on the cart page.
    pub const PROMO_CODE: &str = "promo_code";

    /// Key for the order number of the most recent checkout.
    pub const LAST_ORDER: &str = "last_order";

    /// Key for the admin login marker.
    pub const CURRENT_ADMIN: &str = "current_admin";
}

/// The visitor's cart and promo code, loaded from the session.
///
/// Handlers mutate [`SessionCart::cart`] and call [`SessionCart::save`];
/// nothing is written back implicitly.
pub struct SessionCart {
    session: Session,
    pub cart: Cart,
    pub promo_code: Option<String>,
}

impl SessionCart {
    /// Load the cart and promo code from a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: Session) -> Result<Self, tower_sessions::session::Error> {
        let cart = session.get::<Cart>(keys::CART).await?.unwrap_or_default();
        let promo_code = session.get::<String>(keys::PROMO_CODE).await?;
        Ok(Self {
            session,
            cart,
            promo_code,
        })
    }

    /// Write the cart and promo code back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self) -> Result<(), tower_sessions::session::Error> {
        if self.cart.is_empty() {
            self.session.remove::<Cart>(keys::CART).await?;
        } else {
            self.session.insert(keys::CART, &self.cart).await?;
        }
        match &self.promo_code {
            Some(code) => self.session.insert(keys::PROMO_CODE, code).await?,
            None => {
                self.session.remove::<String>(keys::PROMO_CODE).await?;
            }
        }
        Ok(())
    }

    /// Empty the cart and forget the promo code, then save.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear(&mut self) -> Result<(), tower_sessions::session::Error> {
        self.cart.clear();
        self.promo_code = None;
        self.save().await
    }

    /// Remember the order number of a completed checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set_last_order(
        &self,
        order_number: &OrderNumber,
    ) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::LAST_ORDER, order_number).await
    }

    /// Order number of the visitor's most recent checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn last_order(&self) -> Result<Option<OrderNumber>, tower_sessions::session::Error> {
        self.session.get(keys::LAST_ORDER).await
    }
}

impl<S> FromRequestParts<S> for SessionCart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_owned()))?;

        Ok(Self::load(session).await?)
    }
}
