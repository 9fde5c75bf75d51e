//! Book Nook Core - domain types and checkout arithmetic.
//!
//! This crate holds everything about the bookstore that can be expressed
//! without I/O:
//! - [`types`] - ids, money, categories and email addresses
//! - [`catalog`] - books and the validated input used to create or edit them
//! - [`cart`] - per-session cart state and its stock rules
//! - [`pricing`] - promo codes and the pricing engine
//! - [`order`] - orders, order items and order numbers
//!
//! # Architecture
//!
//! No database access, no HTTP, no clocks read implicitly: callers pass in the
//! catalog rows and the current time. The `storefront` crate owns persistence
//! and the web surface.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod order;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartEntry, CartError, CartLine, CartSnapshot};
pub use catalog::{Book, BookDraft, BookError, BookInput};
pub use order::{Customer, CustomerError, NewOrder, NewOrderItem, Order, OrderItem, OrderNumber};
pub use pricing::{
    DiscountRule, PriceBreakdown, PricingConfig, PricingEngine, PromoBook, PromoCode, PromoError,
};
pub use types::*;
