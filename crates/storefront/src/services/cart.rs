//! Cart operations against the live catalog.
//!
//! The [`Cart`] itself lives in the session; this service looks up the
//! catalog rows each operation needs and applies the cart's stock rules.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::instrument;

use book_nook_core::{BookId, Cart, CartError, CartSnapshot};

use crate::db::{BookRepository, RepositoryError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Cart operations that need catalog data.
pub struct CartService<'a> {
    books: BookRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            books: BookRepository::new(pool),
        }
    }

    /// Add `quantity` units of a book.
    ///
    /// # Errors
    ///
    /// `CartError::InvalidQuantity` for 0, `CartError::UnknownBook` if the book
    /// does not exist, `CartError::ExceedsStock` if the cart would hold more
    /// than is in stock.
    #[instrument(skip(self, cart))]
    pub async fn add(
        &self,
        cart: &mut Cart,
        book_id: BookId,
        quantity: u32,
    ) -> Result<(), CartServiceError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity.into());
        }
        let book = self
            .books
            .get(book_id)
            .await?
            .ok_or(CartError::UnknownBook(book_id))?;
        cart.add(&book, quantity)?;
        Ok(())
    }

    /// Set the quantity of a book. Zero removes it without a catalog lookup.
    ///
    /// # Errors
    ///
    /// `CartError::UnknownBook` if the book does not exist,
    /// `CartError::ExceedsStock` if `quantity` is more than is in stock.
    #[instrument(skip(self, cart))]
    pub async fn update(
        &self,
        cart: &mut Cart,
        book_id: BookId,
        quantity: u32,
    ) -> Result<(), CartServiceError> {
        if quantity == 0 {
            cart.remove(book_id);
            return Ok(());
        }
        let book = self
            .books
            .get(book_id)
            .await?
            .ok_or(CartError::UnknownBook(book_id))?;
        cart.update_quantity(&book, quantity)?;
        Ok(())
    }

    /// Join the cart against current catalog rows.
    ///
    /// Lines whose book has been deleted are dropped from `cart`; the caller
    /// should persist the cart when [`CartSnapshot::missing`] is non-empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be read.
    pub async fn snapshot(&self, cart: &mut Cart) -> Result<CartSnapshot, RepositoryError> {
        let books = self.books.get_many(&cart.book_ids()).await?;
        let snapshot = cart.snapshot(&books);
        for id in &snapshot.missing {
            tracing::info!(book_id = %id, "Pruning deleted book from cart");
            cart.remove(*id);
        }
        Ok(snapshot)
    }
}
