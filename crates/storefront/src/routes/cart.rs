//! Cart route handlers.
//!
//! Every mutating endpoint returns the updated [`CartView`], priced against
//! the live catalog. An inapplicable promo code does not fail the view: the
//! cart is priced without it and `promo_message` says why.

use axum::{Json, extract::State};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use book_nook_core::{BookId, CartError, PriceBreakdown, PromoError, pricing::normalize_code};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::SessionCart;
use crate::services::cart::CartService;
use crate::state::AppState;

/// One priced cart line.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub book_id: BookId,
    pub slug: String,
    pub title: String,
    pub author: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    pub in_stock: u32,
}

/// Cart page data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub promo_code: Option<String>,
    /// Why the promo code is not applied, if it is not.
    pub promo_message: Option<String>,
    /// Rounded figures.
    pub totals: PriceBreakdown,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub book_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub book_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub book_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PromoForm {
    #[serde(default)]
    pub code: String,
}

/// Quantities arrive as signed integers so that negatives are a validation
/// error rather than a body rejection.
fn quantity(raw: i64) -> Result<u32> {
    u32::try_from(raw).map_err(|_| CartError::InvalidQuantity.into())
}

/// Price the session cart for display, pruning deleted books.
pub(crate) async fn build_cart_view(
    state: &AppState,
    session_cart: &mut SessionCart,
) -> Result<CartView> {
    let snapshot = CartService::new(state.pool())
        .snapshot(&mut session_cart.cart)
        .await?;
    if !snapshot.missing.is_empty() {
        session_cart.save().await?;
    }

    let pricing = state.pricing();
    let (breakdown, promo_message) =
        match pricing.price(&snapshot.entries, session_cart.promo_code.as_deref(), Utc::now()) {
            Ok(breakdown) => (breakdown, None),
            Err(err) => (
                pricing.price_without_promo(&snapshot.entries),
                Some(err.to_string()),
            ),
        };

    Ok(CartView {
        item_count: snapshot.item_count(),
        lines: snapshot
            .entries
            .into_iter()
            .map(|entry| CartLineView {
                line_total: book_nook_core::round_money(entry.line_total()),
                book_id: entry.book.id,
                slug: entry.book.slug,
                title: entry.book.title,
                author: entry.book.author,
                unit_price: entry.book.price.amount(),
                quantity: entry.quantity,
                in_stock: entry.book.stock_quantity,
            })
            .collect(),
        promo_code: session_cart.promo_code.clone(),
        promo_message,
        totals: breakdown.rounded(),
    })
}

/// GET /cart
#[instrument(skip(state, session_cart))]
pub async fn show(
    State(state): State<AppState>,
    mut session_cart: SessionCart,
) -> Result<Json<CartView>> {
    Ok(Json(build_cart_view(&state, &mut session_cart).await?))
}

/// POST /cart/add
#[instrument(skip(state, session_cart))]
pub async fn add(
    State(state): State<AppState>,
    mut session_cart: SessionCart,
    Json(form): Json<AddToCartForm>,
) -> Result<Json<CartView>> {
    let book_id = BookId::new(form.book_id);
    let quantity = quantity(form.quantity)?;

    CartService::new(state.pool())
        .add(&mut session_cart.cart, book_id, quantity)
        .await?;
    session_cart.save().await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("book_id", book_id.to_string()),
            ("quantity", quantity.to_string()),
        ],
    );

    Ok(Json(build_cart_view(&state, &mut session_cart).await?))
}

/// POST /cart/update
#[instrument(skip(state, session_cart))]
pub async fn update(
    State(state): State<AppState>,
    mut session_cart: SessionCart,
    Json(form): Json<UpdateCartForm>,
) -> Result<Json<CartView>> {
    let quantity = quantity(form.quantity)?;

    CartService::new(state.pool())
        .update(&mut session_cart.cart, BookId::new(form.book_id), quantity)
        .await?;
    session_cart.save().await?;

    Ok(Json(build_cart_view(&state, &mut session_cart).await?))
}

/// POST /cart/remove
#[instrument(skip(state, session_cart))]
pub async fn remove(
    State(state): State<AppState>,
    mut session_cart: SessionCart,
    Json(form): Json<RemoveFromCartForm>,
) -> Result<Json<CartView>> {
    if session_cart.cart.remove(BookId::new(form.book_id)) {
        session_cart.save().await?;
    }

    Ok(Json(build_cart_view(&state, &mut session_cart).await?))
}

/// POST /cart/promo
///
/// An empty code clears the promo. Unknown codes are rejected and not
/// stored; known codes are stored even if the cart does not qualify yet.
#[instrument(skip(state, session_cart))]
pub async fn apply_promo(
    State(state): State<AppState>,
    mut session_cart: SessionCart,
    Json(form): Json<PromoForm>,
) -> Result<Json<CartView>> {
    let code = form.code.trim();
    if code.is_empty() {
        session_cart.promo_code = None;
    } else {
        let promo = state
            .pricing()
            .promos()
            .lookup(code)
            .ok_or_else(|| AppError::Promo(PromoError::Unknown(normalize_code(code))))?;
        session_cart.promo_code = Some(promo.code.clone());
    }
    session_cart.save().await?;

    Ok(Json(build_cart_view(&state, &mut session_cart).await?))
}
