//! Admin panel routes.
//!
//! Everything except `/login` requires the session admin marker set by a
//! successful login; see [`RequireAdmin`](crate::middleware::RequireAdmin).

pub mod auth;
pub mod books;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin routes router, nested under `/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/books", get(books::index).post(books::create))
        .route(
            "/books/{id}",
            get(books::show).put(books::update).delete(books::destroy),
        )
}
