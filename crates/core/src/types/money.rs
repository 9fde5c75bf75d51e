//! Decimal money handling.
//!
//! All arithmetic is done on [`rust_decimal::Decimal`] at full precision.
//! Rounding to cents happens only through [`round_money`], which callers use
//! when a figure is displayed or persisted.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places a displayed or persisted amount carries.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to cents, half away from zero, and pad it to two places.
///
/// ```
/// use book_nook_core::round_money;
/// use rust_decimal::Decimal;
///
/// let tax: Decimal = "1.125".parse().unwrap();
/// assert_eq!(round_money(tax).to_string(), "1.13");
/// assert_eq!(round_money(Decimal::from(3)).to_string(), "3.00");
/// ```
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Largest unit price accepted for a book.
pub const MAX_PRICE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, MONEY_SCALE);

/// Error returned when constructing a [`Price`] from an unusable amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    #[error("price cannot exceed 1000000.00 (got {0})")]
    TooLarge(Decimal),
    #[error("price must be in whole cents (got {0})")]
    FractionalCents(Decimal),
}

/// A unit price in dollars: between zero and [`MAX_PRICE`], in whole cents.
///
/// Whole cents keep every line total exact, so rounded line totals always
/// add up to the order subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if `amount` is negative, above [`MAX_PRICE`], or
    /// has fractional cents.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > MAX_PRICE {
            return Err(PriceError::TooLarge(amount));
        }
        if amount.normalize().scale() > MONEY_SCALE {
            return Err(PriceError::FractionalCents(amount));
        }
        Ok(Self(amount))
    }

    /// The amount in dollars, at the precision it was entered with.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, unrounded.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", round_money(self.0))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}
