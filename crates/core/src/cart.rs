//! Per-session shopping cart.
//!
//! A [`Cart`] is an ordered list of `(book id, quantity)` lines. It holds no
//! prices: [`Cart::snapshot`] joins it against live catalog rows whenever a
//! priced view is needed, so prices shown before checkout always reflect the
//! current catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Book;
use crate::types::BookId;

/// Cart validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("book {0} does not exist")]
    UnknownBook(BookId),
    #[error("only {available} of '{title}' in stock (requested {requested})")]
    ExceedsStock {
        book_id: BookId,
        title: String,
        requested: u32,
        available: u32,
    },
}

/// One cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub book_id: BookId,
    pub quantity: u32,
}

/// An ordered mapping from book id to requested quantity.
///
/// Invariant: every stored quantity is at least 1 and each book appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in the order books were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of `book_id` currently in the cart (0 if absent).
    #[must_use]
    pub fn quantity_of(&self, book_id: BookId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.book_id == book_id)
            .map_or(0, |line| line.quantity)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Book ids in cart order.
    #[must_use]
    pub fn book_ids(&self) -> Vec<BookId> {
        self.lines.iter().map(|line| line.book_id).collect()
    }

    /// Add `quantity` units of `book`, on top of whatever is already in the cart.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` if `quantity` is 0, `ExceedsStock` if the resulting
    /// cart quantity would exceed the book's current stock. The cart is left
    /// unchanged on error.
    pub fn add(&mut self, book: &Book, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let requested = self.quantity_of(book.id).saturating_add(quantity);
        ensure_stock(book, requested)?;
        self.set(book.id, requested);
        Ok(())
    }

    /// Set the quantity of `book` to exactly `quantity`. Zero removes the line.
    ///
    /// # Errors
    ///
    /// `ExceedsStock` if `quantity` is more than the book's current stock.
    pub fn update_quantity(&mut self, book: &Book, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            self.remove(book.id);
            return Ok(());
        }
        ensure_stock(book, quantity)?;
        self.set(book.id, quantity);
        Ok(())
    }

    /// Remove a book from the cart. Returns whether a line was removed.
    pub fn remove(&mut self, book_id: BookId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.book_id != book_id);
        self.lines.len() != before
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Join the cart against catalog rows.
    ///
    /// `books` may be in any order and may contain books that are not in the
    /// cart. Lines whose book is missing from `books` are reported in
    /// [`CartSnapshot::missing`] rather than priced.
    #[must_use]
    pub fn snapshot(&self, books: &[Book]) -> CartSnapshot {
        let mut entries = Vec::with_capacity(self.lines.len());
        let mut missing = Vec::new();
        for line in &self.lines {
            match books.iter().find(|book| book.id == line.book_id) {
                Some(book) => entries.push(CartEntry {
                    book: book.clone(),
                    quantity: line.quantity,
                }),
                None => missing.push(line.book_id),
            }
        }
        CartSnapshot { entries, missing }
    }

    fn set(&mut self, book_id: BookId, quantity: u32) {
        match self.lines.iter_mut().find(|line| line.book_id == book_id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine { book_id, quantity }),
        }
    }
}

fn ensure_stock(book: &Book, requested: u32) -> Result<(), CartError> {
    if book.has_stock_for(requested) {
        Ok(())
    } else {
        Err(CartError::ExceedsStock {
            book_id: book.id,
            title: book.title.clone(),
            requested,
            available: book.stock_quantity,
        })
    }
}

/// A cart line joined with the live catalog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    pub book: Book,
    pub quantity: u32,
}

impl CartEntry {
    /// Unit price times quantity, unrounded.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.book.price.times(self.quantity)
    }
}

/// The result of [`Cart::snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Priced lines, in cart order.
    pub entries: Vec<CartEntry>,
    /// Cart lines whose book no longer exists in the catalog.
    pub missing: Vec<BookId>,
}

impl CartSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, entry| acc.saturating_add(entry.quantity))
    }
}
