//! HTTP route handlers for the storefront.
//!
//! All endpoints speak JSON. Errors use the body shape described in
//! [`crate::error`].
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Catalog
//! GET  /                       - Featured book, categories, cart count
//! GET  /books                  - Book listing (?category=fiction)
//! GET  /books/{id}             - Book detail
//! GET  /search                 - Search title, author and category (?q=)
//!
//! # Cart
//! GET  /cart                   - Priced cart
//! POST /cart/add               - Add a book (quantity defaults to 1)
//! POST /cart/update            - Set a quantity (0 removes)
//! POST /cart/remove            - Remove a book
//! POST /cart/promo             - Apply or clear a promo code
//!
//! # Checkout
//! GET  /checkout               - Checkout preview
//! POST /checkout               - Place the order
//! GET  /receipt                - Receipt for this session's last order
//! GET  /receipt/{order_number} - Receipt by order number
//!
//! # Admin (requires login)
//! POST /admin/login            - Log in with the admin password
//! POST /admin/logout           - Log out
//! GET  /admin/books            - List books
//! POST /admin/books            - Create a book
//! GET  /admin/books/{id}       - Read a book
//! PUT  /admin/books/{id}       - Update a book
//! DELETE /admin/books/{id}     - Delete a book
//! ```

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/promo", post(cart::apply_promo))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/", get(catalog::home))
        .route("/books", get(catalog::list_books))
        .route("/books/{id}", get(catalog::book_detail))
        .route("/search", get(catalog::search))
        // Cart
        .nest("/cart", cart_routes())
        // Checkout
        .route(
            "/checkout",
            get(checkout::preview).post(checkout::place_order),
        )
        .route("/receipt", get(checkout::last_receipt))
        .route("/receipt/{order_number}", get(checkout::receipt))
        // Admin panel
        .nest("/admin", admin::routes())
}
