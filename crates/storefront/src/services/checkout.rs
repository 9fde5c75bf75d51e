//! Checkout: turn a session cart into a placed order.
//!
//! # Flow
//!
//! 1. Reject an empty cart and invalid customer details.
//! 2. Re-read current stock for every line and report all shortfalls.
//! 3. Price the cart, surfacing promo errors.
//! 4. Place the order: conditional stock decrements, order row and order
//!    items in one transaction.
//!
//! Step 2 catches the common case with a useful message; step 4 is what
//! actually guarantees stock never goes negative when checkouts race.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::instrument;

use book_nook_core::{
    BookId, Cart, CartEntry, Customer, CustomerError, NewOrder, Order, OrderNumber,
    PriceBreakdown, PricingEngine, PromoError,
};

use crate::db::{BookRepository, OrderRepository, PlaceOrderError, RepositoryError};
use crate::services::cart::CartService;

/// A line that cannot be fulfilled from current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockShortfall {
    pub book_id: BookId,
    /// `None` when the book has been removed from the catalog.
    pub title: Option<String>,
    pub requested: u32,
    pub available: u32,
}

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    InvalidCustomer(#[from] CustomerError),

    #[error("not enough stock for {} item(s)", .0.len())]
    OutOfStock(Vec<StockShortfall>),

    #[error(transparent)]
    Promo(#[from] PromoError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A priced cart that passed the stock check.
#[derive(Debug, Clone)]
pub struct CheckoutPreview {
    pub entries: Vec<CartEntry>,
    /// Full-precision figures; round with [`PriceBreakdown::rounded`] to display.
    pub breakdown: PriceBreakdown,
    /// Canonical form of the applied promo code.
    pub promo_code: Option<String>,
}

/// Checkout orchestration over the catalog, pricing engine and order store.
pub struct CheckoutService<'a> {
    pool: &'a SqlitePool,
    pricing: &'a PricingEngine,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, pricing: &'a PricingEngine) -> Self {
        Self { pool, pricing }
    }

    /// Price the cart as it would be charged right now.
    ///
    /// Deleted books are pruned from `cart` and reported as shortfalls.
    ///
    /// # Errors
    ///
    /// `EmptyCart`, `OutOfStock` naming every short line, `Promo` if the
    /// promo code cannot be applied, or `Repository` on database errors.
    pub async fn preview(
        &self,
        cart: &mut Cart,
        promo_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CheckoutPreview, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let requested: Vec<_> = cart.lines().to_vec();
        let snapshot = CartService::new(self.pool).snapshot(cart).await?;

        let mut shortfalls: Vec<StockShortfall> = requested
            .iter()
            .filter(|line| snapshot.missing.contains(&line.book_id))
            .map(|line| StockShortfall {
                book_id: line.book_id,
                title: None,
                requested: line.quantity,
                available: 0,
            })
            .collect();
        shortfalls.extend(
            snapshot
                .entries
                .iter()
                .filter(|entry| !entry.book.has_stock_for(entry.quantity))
                .map(|entry| StockShortfall {
                    book_id: entry.book.id,
                    title: Some(entry.book.title.clone()),
                    requested: entry.quantity,
                    available: entry.book.stock_quantity,
                }),
        );
        if !shortfalls.is_empty() {
            return Err(CheckoutError::OutOfStock(shortfalls));
        }

        let breakdown = self.pricing.price(&snapshot.entries, promo_code, now)?;
        let promo_code = promo_code
            .and_then(|code| self.pricing.promos().lookup(code))
            .map(|promo| promo.code.clone());

        Ok(CheckoutPreview {
            entries: snapshot.entries,
            breakdown,
            promo_code,
        })
    }

    /// Place an order for the cart.
    ///
    /// On success the caller clears the session cart; on any error nothing
    /// has been written.
    ///
    /// # Errors
    ///
    /// `EmptyCart` or `InvalidCustomer` for bad input, otherwise as
    /// [`CheckoutService::preview`]. A stock race lost inside the
    /// transaction is reported as `OutOfStock` with fresh stock figures.
    #[instrument(skip(self, cart, name, email))]
    pub async fn checkout(
        &self,
        cart: &mut Cart,
        promo_code: Option<&str>,
        name: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let customer = Customer::new(name, email)?;

        let preview = self.preview(cart, promo_code, now).await?;
        let order = NewOrder::from_snapshot(
            OrderNumber::generate(),
            customer,
            preview.promo_code,
            &preview.entries,
            &preview.breakdown,
        );

        match OrderRepository::new(self.pool).place(&order).await {
            Ok(placed) => {
                tracing::info!(
                    order_number = %placed.order_number,
                    total = %placed.total,
                    items = placed.item_count(),
                    "Order placed"
                );
                Ok(placed)
            }
            Err(PlaceOrderError::InsufficientStock(ids)) => {
                tracing::warn!(?ids, "Stock changed during checkout");
                Err(CheckoutError::OutOfStock(
                    self.shortfalls_for(&order, &ids).await?,
                ))
            }
            Err(PlaceOrderError::Repository(e)) => Err(e.into()),
        }
    }

    async fn shortfalls_for(
        &self,
        order: &NewOrder,
        ids: &[BookId],
    ) -> Result<Vec<StockShortfall>, RepositoryError> {
        let books = BookRepository::new(self.pool).get_many(ids).await?;
        Ok(order
            .items
            .iter()
            .filter(|item| ids.contains(&item.book_id))
            .map(|item| {
                let book = books.iter().find(|b| b.id == item.book_id);
                StockShortfall {
                    book_id: item.book_id,
                    title: Some(item.title.clone()),
                    requested: item.quantity,
                    available: book.map_or(0, |b| b.stock_quantity),
                }
            })
            .collect())
    }
}
