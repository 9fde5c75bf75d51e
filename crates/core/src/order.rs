//! Orders and the data captured when one is placed.

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartEntry;
use crate::pricing::PriceBreakdown;
use crate::types::{BookId, Email, EmailError, OrderId, round_money};

/// Maximum length of a customer name.
pub const MAX_NAME_LENGTH: usize = 120;

/// Length of a generated order number.
pub const ORDER_NUMBER_LENGTH: usize = 8;

/// Short public reference printed on receipts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a fresh random order number, eight upper-case hex characters.
    #[must_use]
    pub fn generate() -> Self {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        Self(
            simple
                .chars()
                .take(ORDER_NUMBER_LENGTH)
                .map(|c| c.to_ascii_uppercase())
                .collect(),
        )
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Invalid customer details at checkout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomerError {
    #[error("name is required")]
    MissingName,
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Who an order is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub email: Email,
}

impl Customer {
    /// Validate checkout form input.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError` if the trimmed name is empty or too long, or if
    /// the email does not parse.
    pub fn new(name: &str, email: &str) -> Result<Self, CustomerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CustomerError::MissingName);
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(CustomerError::NameTooLong {
                max: MAX_NAME_LENGTH,
            });
        }
        Ok(Self {
            name: name.to_owned(),
            email: Email::parse(email)?,
        })
    }
}

/// A line to be written with a new order. Title and price are copied from
/// the catalog row at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub book_id: BookId,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Everything needed to persist an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer: Customer,
    pub promo_code: Option<String>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Build an order from priced cart entries. Stored totals are the
    /// cents-rounded figures of `breakdown`.
    #[must_use]
    pub fn from_snapshot(
        order_number: OrderNumber,
        customer: Customer,
        promo_code: Option<String>,
        entries: &[CartEntry],
        breakdown: &PriceBreakdown,
    ) -> Self {
        let shown = breakdown.rounded();
        Self {
            order_number,
            customer,
            promo_code,
            subtotal: shown.subtotal,
            discount: shown.discount,
            tax: shown.tax,
            shipping: shown.shipping,
            total: shown.total,
            items: entries
                .iter()
                .map(|entry| NewOrderItem {
                    book_id: entry.book.id,
                    title: entry.book.title.clone(),
                    unit_price: entry.book.price.amount(),
                    quantity: entry.quantity,
                })
                .collect(),
        }
    }

    /// Units ordered per book, for the stock decrement.
    #[must_use]
    pub fn quantities(&self) -> Vec<(BookId, u32)> {
        self.items
            .iter()
            .map(|item| (item.book_id, item.quantity))
            .collect()
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: String,
    pub promo_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub items: Vec<OrderItem>,
}

impl Order {
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }
}

/// A line on a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub book_id: BookId,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    /// `unit_price × quantity`. Unit prices are whole cents, so this is
    /// exact and the line totals of an order add up to its `subtotal`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::catalog::Book;
    use crate::pricing::{PricingConfig, PricingEngine, PromoBook};
    use crate::types::{Category, Price};

    #[test]
    fn test_order_number_shape() {
        let number = OrderNumber::generate();
        assert_eq!(number.as_str().len(), ORDER_NUMBER_LENGTH);
        assert!(
            number
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
        assert_ne!(number, OrderNumber::generate());
    }

    #[test]
    fn test_customer_validation() {
        let customer = Customer::new("  Ada Reader ", " ada@example.com").unwrap();
        assert_eq!(customer.name, "Ada Reader");
        assert_eq!(customer.email.as_str(), "ada@example.com");

        assert_eq!(
            Customer::new(" ", "ada@example.com"),
            Err(CustomerError::MissingName)
        );
        assert!(matches!(
            Customer::new("Ada", "not-an-email"),
            Err(CustomerError::Email(_))
        ));
        assert!(matches!(
            Customer::new(&"x".repeat(MAX_NAME_LENGTH + 1), "ada@example.com"),
            Err(CustomerError::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_new_order_copies_snapshot_and_rounds_totals() {
        let entries = vec![CartEntry {
            book: Book {
                id: BookId::new(4),
                slug: "caroline".to_owned(),
                title: "Caroline".to_owned(),
                author: "Neil Gaiman".to_owned(),
                category: Category::Fiction,
                price: Price::new(dec!(8.99)).unwrap(),
                stock_quantity: 10,
                image: None,
            },
            quantity: 3,
        }];
        let engine = PricingEngine::new(PricingConfig::default(), PromoBook::default());
        let breakdown = engine.price_without_promo(&entries);

        let order = NewOrder::from_snapshot(
            OrderNumber::from("ABCD1234".to_owned()),
            Customer::new("Ada", "ada@example.com").unwrap(),
            None,
            &entries,
            &breakdown,
        );

        assert_eq!(order.subtotal, dec!(26.97));
        // 26.97 × 0.0825 = 2.225025
        assert_eq!(order.tax.to_string(), "2.23");
        assert_eq!(order.shipping.to_string(), "0.00");
        assert_eq!(order.total.to_string(), "29.20");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].unit_price, dec!(8.99));
        assert_eq!(order.quantities(), vec![(BookId::new(4), 3)]);
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem {
            book_id: BookId::new(1),
            title: "Sapiens".to_owned(),
            unit_price: dec!(9.99),
            quantity: 2,
        };
        assert_eq!(item.line_total().to_string(), "19.98");
    }

    #[test]
    fn test_line_totals_add_up_to_subtotal() {
        let book = |id: i64, price: Decimal| Book {
            id: BookId::new(id),
            slug: format!("book-{id}"),
            title: format!("Book {id}"),
            author: "Anon".to_owned(),
            category: Category::Fiction,
            price: Price::new(price).unwrap(),
            stock_quantity: 10,
            image: None,
        };
        let entries = vec![
            CartEntry {
                book: book(1, dec!(7.99)),
                quantity: 3,
            },
            CartEntry {
                book: book(2, dec!(0.07)),
                quantity: 7,
            },
            CartEntry {
                book: book(3, dec!(12.5)),
                quantity: 1,
            },
        ];
        let engine = PricingEngine::new(PricingConfig::default(), PromoBook::default());
        let breakdown = engine.price_without_promo(&entries);

        let new_order = NewOrder::from_snapshot(
            OrderNumber::from("WXYZ9876".to_owned()),
            Customer::new("Ada", "ada@example.com").unwrap(),
            None,
            &entries,
            &breakdown,
        );
        let sum: Decimal = new_order
            .items
            .iter()
            .map(|item| OrderItem {
                book_id: item.book_id,
                title: item.title.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .map(|item| item.line_total())
            .sum();

        assert_eq!(sum, new_order.subtotal);
        assert_eq!(new_order.subtotal.to_string(), "36.96");
    }
}
