//! Core value types for Book Nook.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod money;

pub use category::{Category, CategoryError};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{MAX_PRICE, MONEY_SCALE, Price, PriceError, round_money};
