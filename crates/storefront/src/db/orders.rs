//! Order repository.
//!
//! [`OrderRepository::place`] is the only write path for orders. Stock
//! decrements, the order row and its lines commit together or not at all.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;

use book_nook_core::{BookId, NewOrder, Order, OrderId, OrderItem, OrderNumber};

use super::{RepositoryError, map_constraint, parse_count, parse_decimal};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// One or more books no longer had enough stock when the decrement ran.
    #[error("insufficient stock for {} book(s)", .0.len())]
    InsufficientStock(Vec<BookId>),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    customer_name: String,
    customer_email: String,
    promo_code: Option<String>,
    subtotal: String,
    discount: String,
    tax: String,
    shipping: String,
    total: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    book_id: i64,
    title: String,
    unit_price: String,
    quantity: i64,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            book_id: BookId::new(row.book_id),
            title: row.title,
            unit_price: parse_decimal("order_item.unit_price", &row.unit_price)?,
            quantity: parse_count("order_item.quantity", row.quantity)?,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Decrement stock for every line and record the order, atomically.
    ///
    /// Each line runs a conditional decrement that only succeeds while stock
    /// covers the quantity, so concurrent checkouts can never drive stock
    /// below zero. If any line fails, the transaction is rolled back and no
    /// stock, order or order item is written.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError::InsufficientStock` naming every line whose
    /// decrement failed, or `PlaceOrderError::Repository` on database errors.
    pub async fn place(&self, order: &NewOrder) -> Result<Order, PlaceOrderError> {
        let mut tx = self.pool.begin().await?;

        let mut short = Vec::new();
        for (book_id, quantity) in order.quantities() {
            let result = sqlx::query(
                r"
                UPDATE book
                SET stock_quantity = stock_quantity - ?1,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                WHERE id = ?2 AND stock_quantity >= ?1
                ",
            )
            .bind(i64::from(quantity))
            .bind(book_id.as_i64())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                short.push(book_id);
            }
        }
        if !short.is_empty() {
            tx.rollback().await?;
            return Err(PlaceOrderError::InsufficientStock(short));
        }

        let created_at = Utc::now();
        let order_id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO customer_order
                (order_number, customer_name, customer_email, promo_code,
                 subtotal, discount, tax, shipping, total, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(order.order_number.as_str())
        .bind(&order.customer.name)
        .bind(order.customer.email.as_str())
        .bind(order.promo_code.as_deref())
        .bind(order.subtotal.to_string())
        .bind(order.discount.to_string())
        .bind(order.tax.to_string())
        .bind(order.shipping.to_string())
        .bind(order.total.to_string())
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "order number already exists"))?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO order_item (order_id, book_id, title, unit_price, quantity)
                VALUES (?, ?, ?, ?, ?)
                ",
            )
            .bind(order_id)
            .bind(item.book_id.as_i64())
            .bind(&item.title)
            .bind(item.unit_price.to_string())
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id: OrderId::new(order_id),
            order_number: order.order_number.clone(),
            customer_name: order.customer.name.clone(),
            customer_email: order.customer.email.as_str().to_owned(),
            promo_code: order.promo_code.clone(),
            created_at,
            subtotal: order.subtotal,
            discount: order.discount,
            tax: order.tax,
            shipping: order.shipping,
            total: order.total,
            items: order
                .items
                .iter()
                .map(|item| OrderItem {
                    book_id: item.book_id,
                    title: item.title.clone(),
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                })
                .collect(),
        })
    }

    /// Get an order and its items by public order number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored amount is invalid.
    pub async fn get_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, order_number, customer_name, customer_email, promo_code,
                   subtotal, discount, tax, shipping, total, created_at
            FROM customer_order
            WHERE order_number = ?
            ",
        )
        .bind(order_number)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT book_id, title, unit_price, quantity
            FROM order_item
            WHERE order_id = ?
            ORDER BY id
            ",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Order {
            id: OrderId::new(row.id),
            order_number: OrderNumber::from(row.order_number),
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            promo_code: row.promo_code,
            created_at: row.created_at,
            subtotal: parse_decimal("customer_order.subtotal", &row.subtotal)?,
            discount: parse_decimal("customer_order.discount", &row.discount)?,
            tax: parse_decimal("customer_order.tax", &row.tax)?,
            shipping: parse_decimal("customer_order.shipping", &row.shipping)?,
            total: parse_decimal("customer_order.total", &row.total)?,
            items,
        }))
    }

    /// Number of orders recorded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer_order")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use book_nook_core::{BookDraft, Cart, Customer, PricingConfig, PricingEngine, PromoBook};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::db::BookRepository;
    use crate::db::test_support::seeded_pool;

    async fn new_order(pool: &SqlitePool, lines: &[(i64, u32)]) -> NewOrder {
        let books = BookRepository::new(pool);
        let ids: Vec<_> = lines.iter().map(|(id, _)| BookId::new(*id)).collect();
        let rows = books.get_many(&ids).await.unwrap();

        let mut cart = Cart::new();
        for (id, quantity) in lines {
            let mut book = rows.iter().find(|b| b.id.as_i64() == *id).unwrap().clone();
            // Build the order even when stock is short, to exercise the decrement guard.
            book.stock_quantity = u32::MAX;
            cart.add(&book, *quantity).unwrap();
        }
        let snapshot = cart.snapshot(&rows);
        let engine = PricingEngine::new(PricingConfig::default(), PromoBook::default());
        let breakdown = engine.price_without_promo(&snapshot.entries);

        NewOrder::from_snapshot(
            OrderNumber::generate(),
            Customer::new("Ada Reader", "ada@example.com").unwrap(),
            None,
            &snapshot.entries,
            &breakdown,
        )
    }

    async fn stock_of(pool: &SqlitePool, id: i64) -> u32 {
        BookRepository::new(pool)
            .get(BookId::new(id))
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    #[tokio::test]
    async fn test_place_decrements_stock_and_persists() {
        let pool = seeded_pool().await;
        let orders = OrderRepository::new(&pool);

        let order = new_order(&pool, &[(1, 2), (5, 1)]).await;
        let placed = orders.place(&order).await.unwrap();

        assert_eq!(stock_of(&pool, 1).await, 8);
        assert_eq!(stock_of(&pool, 5).await, 9);

        let loaded = orders
            .get_by_number(placed.order_number.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.total, placed.total);
        assert_eq!(loaded.total.to_string(), placed.total.to_string());
        assert_eq!(loaded.customer_email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_place_is_all_or_nothing() {
        let pool = seeded_pool().await;
        let orders = OrderRepository::new(&pool);

        // Book 1 has 10 in stock; book 3 cannot cover 11.
        let order = new_order(&pool, &[(1, 2), (3, 11)]).await;
        let err = orders.place(&order).await.unwrap_err();

        match err {
            PlaceOrderError::InsufficientStock(ids) => assert_eq!(ids, vec![BookId::new(3)]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(stock_of(&pool, 1).await, 10);
        assert_eq!(stock_of(&pool, 3).await, 10);
        assert_eq!(orders.count().await.unwrap(), 0);

        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_item")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(items, 0);
    }

    #[tokio::test]
    async fn test_concurrent_orders_never_oversell() {
        let pool = seeded_pool().await;

        // 10 in stock; five orders of 3 can only fit three times.
        let mut handles = Vec::new();
        for _ in 0..5 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let order = new_order(&pool, &[(2, 3)]).await;
                OrderRepository::new(&pool).place(&order).await.is_ok()
            }));
        }

        let mut placed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                placed += 1;
            }
        }

        assert_eq!(placed, 3);
        assert_eq!(stock_of(&pool, 2).await, 1);
        assert_eq!(OrderRepository::new(&pool).count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_referenced_book_cannot_be_deleted() {
        let pool = seeded_pool().await;
        let order = new_order(&pool, &[(4, 1)]).await;
        OrderRepository::new(&pool).place(&order).await.unwrap();

        let err = BookRepository::new(&pool)
            .delete(BookId::new(4))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(stock_of(&pool, 4).await, 9);
    }

    #[tokio::test]
    async fn test_order_items_survive_book_edits() {
        let pool = seeded_pool().await;
        let orders = OrderRepository::new(&pool);
        let placed = orders.place(&new_order(&pool, &[(5, 2)]).await).await.unwrap();

        let edited = BookDraft {
            title: "Sapiens (Illustrated)".to_owned(),
            author: "Yuval Noah Harari".to_owned(),
            category: "non-fiction".to_owned(),
            price: dec!(24.00),
            stock_quantity: 8,
            slug: Some("sapiens".to_owned()),
            image: None,
        }
        .validate()
        .unwrap();
        BookRepository::new(&pool)
            .update(BookId::new(5), &edited)
            .await
            .unwrap();

        let loaded = orders
            .get_by_number(placed.order_number.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.items[0].title, "Sapiens");
        assert_eq!(loaded.items[0].unit_price.to_string(), "9.99");
        assert_eq!(loaded.subtotal.to_string(), "19.98");
        assert_eq!(loaded.total, placed.total);
    }

    #[tokio::test]
    async fn test_unknown_order_number() {
        let pool = seeded_pool().await;
        let found = OrderRepository::new(&pool)
            .get_by_number("NOPE0000")
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
