//! Domain models for storefront sessions.

pub mod session;

pub use session::{CurrentAdmin, SessionCart, keys as session_keys};
