//! Checkout pricing: subtotal, promo discount, tax, shipping and total.
//!
//! # Order of operations
//!
//! ```text
//! subtotal = Σ unit_price × quantity
//! discount = promo rule applied to subtotal (never more than subtotal)
//! taxable  = subtotal − discount
//! tax      = taxable × tax_rate
//! shipping = 0 if taxable ≥ free_shipping_min or promo waives shipping, else flat fee
//! total    = taxable + tax + shipping
//! ```
//!
//! Every figure in a [`PriceBreakdown`] is kept at full precision;
//! [`PriceBreakdown::rounded`] produces the cents-rounded copy used for
//! display and persistence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cart::CartEntry;
use crate::types::round_money;

/// Tax and shipping settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    /// Fraction of the taxable amount charged as tax (0.0825 = 8.25%).
    pub tax_rate: Decimal,
    /// Flat shipping fee charged below the free-shipping threshold.
    pub shipping_flat: Decimal,
    /// Taxable amount at or above which shipping is free.
    pub free_shipping_min: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(825, 4),
            shipping_flat: Decimal::new(499, 2),
            free_shipping_min: Decimal::new(2500, 2),
        }
    }
}

/// What a promo code does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountRule {
    /// Fraction of the subtotal taken off (0.10 = 10% off).
    Percent(Decimal),
    /// Fixed amount taken off, capped at the subtotal.
    Flat(Decimal),
    /// No discount; shipping is waived.
    FreeShipping,
}

/// Reasons a promo code cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromoError {
    #[error("promo code {0} is not valid")]
    Unknown(String),
    #[error("promo code {0} has expired")]
    Expired(String),
    #[error("promo code {code} applies to orders of ${minimum} or more")]
    BelowMinimum { code: String, minimum: Decimal },
}

/// A redeemable promo code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCode {
    /// Canonical (upper-case) code.
    pub code: String,
    pub rule: DiscountRule,
    /// Minimum subtotal required, if any.
    pub min_subtotal: Option<Decimal>,
    /// Instant after which the code is no longer accepted.
    pub expires_at: Option<DateTime<Utc>>,
}

impl PromoCode {
    #[must_use]
    pub fn new(code: &str, rule: DiscountRule) -> Self {
        Self {
            code: normalize_code(code),
            rule,
            min_subtotal: None,
            expires_at: None,
        }
    }

    #[must_use]
    pub const fn with_min_subtotal(mut self, minimum: Decimal) -> Self {
        self.min_subtotal = Some(minimum);
        self
    }

    #[must_use]
    pub const fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Check the validity predicate for a cart with this `subtotal` at `now`.
    ///
    /// # Errors
    ///
    /// `Expired` once `now` reaches `expires_at`, `BelowMinimum` if the
    /// subtotal is under `min_subtotal`.
    pub fn check(&self, subtotal: Decimal, now: DateTime<Utc>) -> Result<(), PromoError> {
        if self.expires_at.is_some_and(|at| now >= at) {
            return Err(PromoError::Expired(self.code.clone()));
        }
        if let Some(minimum) = self.min_subtotal
            && subtotal < minimum
        {
            return Err(PromoError::BelowMinimum {
                code: self.code.clone(),
                minimum,
            });
        }
        Ok(())
    }

    /// Discount this code gives on `subtotal`. Never negative, never above `subtotal`.
    #[must_use]
    pub fn discount_on(&self, subtotal: Decimal) -> Decimal {
        let raw = match self.rule {
            DiscountRule::Percent(fraction) => subtotal * fraction,
            DiscountRule::Flat(amount) => amount,
            DiscountRule::FreeShipping => Decimal::ZERO,
        };
        raw.clamp(Decimal::ZERO, subtotal.max(Decimal::ZERO))
    }

    #[must_use]
    pub const fn waives_shipping(&self) -> bool {
        matches!(self.rule, DiscountRule::FreeShipping)
    }
}

/// Canonical form of a code as typed by a customer.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// The set of codes the store accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoBook {
    codes: Vec<PromoCode>,
}

impl PromoBook {
    #[must_use]
    pub const fn new(codes: Vec<PromoCode>) -> Self {
        Self { codes }
    }

    /// Find a code, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<&PromoCode> {
        let code = normalize_code(code);
        self.codes.iter().find(|promo| promo.code == code)
    }

    #[must_use]
    pub fn codes(&self) -> &[PromoCode] {
        &self.codes
    }
}

impl Default for PromoBook {
    /// The store's standing promotions.
    fn default() -> Self {
        Self::new(vec![
            PromoCode::new("SAVE10", DiscountRule::Percent(Decimal::new(10, 2))),
            PromoCode::new("READMORE15", DiscountRule::Percent(Decimal::new(15, 2)))
                .with_min_subtotal(Decimal::new(2500, 2)),
            PromoCode::new("FREESHIP", DiscountRule::FreeShipping),
            PromoCode::new("TAKE5", DiscountRule::Flat(Decimal::new(500, 2))),
        ])
    }
}

/// Priced order figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub taxable: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    /// Copy with every figure rounded to cents, as shown and stored.
    ///
    /// Each part is rounded from its full-precision value, then `taxable`
    /// and `total` are recomputed from the rounded parts so the figures on
    /// a receipt always add up.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let subtotal = round_money(self.subtotal);
        let discount = round_money(self.discount);
        let taxable = round_money((subtotal - discount).max(Decimal::ZERO));
        let tax = round_money(self.tax);
        let shipping = round_money(self.shipping);

        Self {
            subtotal,
            discount,
            taxable,
            tax,
            shipping,
            total: taxable + tax + shipping,
        }
    }
}

/// Computes [`PriceBreakdown`]s from cart snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingEngine {
    config: PricingConfig,
    promos: PromoBook,
}

impl PricingEngine {
    #[must_use]
    pub const fn new(config: PricingConfig, promos: PromoBook) -> Self {
        Self { config, promos }
    }

    #[must_use]
    pub const fn config(&self) -> &PricingConfig {
        &self.config
    }

    #[must_use]
    pub const fn promos(&self) -> &PromoBook {
        &self.promos
    }

    /// Price a cart snapshot.
    ///
    /// A blank `promo_code` is treated as no code.
    ///
    /// # Errors
    ///
    /// Returns `PromoError` if a code is given and it is unknown, expired or
    /// its minimum subtotal is not met. Whether to surface that or fall back
    /// to [`PricingEngine::price_without_promo`] is the caller's decision.
    pub fn price(
        &self,
        entries: &[CartEntry],
        promo_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PriceBreakdown, PromoError> {
        let subtotal = subtotal(entries);

        let promo = match promo_code.map(str::trim).filter(|code| !code.is_empty()) {
            Some(code) => {
                let promo = self
                    .promos
                    .lookup(code)
                    .ok_or_else(|| PromoError::Unknown(normalize_code(code)))?;
                promo.check(subtotal, now)?;
                Some(promo)
            }
            None => None,
        };

        Ok(self.breakdown(subtotal, promo, !entries.is_empty()))
    }

    /// Price a cart snapshot at full price.
    #[must_use]
    pub fn price_without_promo(&self, entries: &[CartEntry]) -> PriceBreakdown {
        self.breakdown(subtotal(entries), None, !entries.is_empty())
    }

    fn breakdown(
        &self,
        subtotal: Decimal,
        promo: Option<&PromoCode>,
        has_items: bool,
    ) -> PriceBreakdown {
        let discount = promo.map_or(Decimal::ZERO, |p| p.discount_on(subtotal));
        let taxable = (subtotal - discount).max(Decimal::ZERO);
        let tax = taxable * self.config.tax_rate;
        // An empty cart has nothing to ship
        let shipping = if !has_items
            || taxable >= self.config.free_shipping_min
            || promo.is_some_and(PromoCode::waives_shipping)
        {
            Decimal::ZERO
        } else {
            self.config.shipping_flat
        };
        let total = taxable + tax + shipping;

        PriceBreakdown {
            subtotal,
            discount,
            taxable,
            tax,
            shipping,
            total,
        }
    }
}

/// Sum of line totals, order independent.
#[must_use]
pub fn subtotal(entries: &[CartEntry]) -> Decimal {
    entries.iter().map(CartEntry::line_total).sum()
}
