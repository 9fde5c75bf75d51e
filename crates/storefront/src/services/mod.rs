//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Admin password verification
//! - `cart` - Session cart operations checked against the catalog
//! - `checkout` - Stock check, pricing and order placement
//!
//! Services borrow the pool (and pricing engine where needed) from
//! [`AppState`](crate::state::AppState) and are constructed per request.

pub mod auth;
pub mod cart;
pub mod checkout;
