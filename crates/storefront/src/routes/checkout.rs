//! Checkout and receipt route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use book_nook_core::{BookId, Order, OrderNumber, PriceBreakdown, round_money};

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::SessionCart;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// One line of the checkout summary.
#[derive(Debug, Serialize)]
pub struct CheckoutLineView {
    pub book_id: BookId,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Checkout page data.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub lines: Vec<CheckoutLineView>,
    pub item_count: u32,
    pub promo_code: Option<String>,
    pub totals: PriceBreakdown,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// GET /checkout
#[instrument(skip(state, session_cart))]
pub async fn preview(
    State(state): State<AppState>,
    mut session_cart: SessionCart,
) -> Result<Json<CheckoutView>> {
    let service = CheckoutService::new(state.pool(), state.pricing());
    let result = service
        .preview(
            &mut session_cart.cart,
            session_cart.promo_code.as_deref(),
            Utc::now(),
        )
        .await;
    // Deleted books may have been pruned even when the preview fails
    session_cart.save().await?;
    let preview = result?;

    Ok(Json(CheckoutView {
        item_count: preview.entries.iter().map(|entry| entry.quantity).sum(),
        lines: preview
            .entries
            .into_iter()
            .map(|entry| CheckoutLineView {
                line_total: round_money(entry.line_total()),
                book_id: entry.book.id,
                title: entry.book.title,
                unit_price: entry.book.price.amount(),
                quantity: entry.quantity,
            })
            .collect(),
        promo_code: preview.promo_code,
        totals: preview.breakdown.rounded(),
    }))
}

/// POST /checkout
///
/// Places the order and empties the cart. On failure the cart is kept
/// (minus any books that no longer exist).
#[instrument(skip(state, session_cart, form))]
pub async fn place_order(
    State(state): State<AppState>,
    mut session_cart: SessionCart,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<Order>)> {
    let service = CheckoutService::new(state.pool(), state.pricing());
    let result = service
        .checkout(
            &mut session_cart.cart,
            session_cart.promo_code.as_deref(),
            &form.name,
            &form.email,
            Utc::now(),
        )
        .await;

    let order = match result {
        Ok(order) => order,
        Err(err) => {
            session_cart.save().await?;
            return Err(err.into());
        }
    };

    session_cart.clear().await?;
    session_cart.set_last_order(&order.order_number).await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        &[("order_number", order.order_number.to_string())],
    );

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /receipt/{order_number}
#[instrument(skip(state))]
pub async fn receipt(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Json<Order>> {
    let order_number = OrderNumber::from(order_number.trim().to_ascii_uppercase());
    find_order(&state, &order_number).await.map(Json)
}

/// GET /receipt
///
/// Receipt for the most recent order placed in this session.
#[instrument(skip(state, session_cart))]
pub async fn last_receipt(
    State(state): State<AppState>,
    session_cart: SessionCart,
) -> Result<Json<Order>> {
    let order_number = session_cart
        .last_order()
        .await?
        .ok_or_else(|| AppError::NotFound("No order placed in this session".to_owned()))?;
    find_order(&state, &order_number).await.map(Json)
}

async fn find_order(state: &AppState, order_number: &OrderNumber) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get_by_number(order_number.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_number} not found")))
}
