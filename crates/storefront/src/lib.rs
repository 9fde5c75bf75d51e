//! Book Nook Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused. The binary in `main.rs` adds
//! configuration, Sentry and the tracing subscriber on top of [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::{Router, routing::get};
use sqlx::SqlitePool;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Errors while preparing the database for serving.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("session store setup failed: {0}")]
    SessionStore(#[from] sqlx::Error),

    #[error("seeding failed: {0}")]
    Seed(#[from] db::RepositoryError),
}

/// Run migrations, create the session table and seed the demo catalog.
///
/// Safe to run on every start: each step is idempotent.
///
/// # Errors
///
/// Returns `PrepareError` naming the step that failed.
pub async fn prepare_database(pool: &SqlitePool) -> Result<(), PrepareError> {
    db::run_migrations(pool).await?;
    middleware::create_session_store(pool).await?;

    let seeded = db::seed::seed_catalog(pool).await?;
    if seeded > 0 {
        tracing::info!(books = seeded, "Seeded demo catalog");
    }
    Ok(())
}

/// Build the full application router with all layers applied.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(session_layer)
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request as HttpRequest, header};
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;

    async fn test_app() -> Router {
        let config = StorefrontConfig::from_lookup(|key| match key {
            "ADMIN_PASSWORD" => Some("letmein".to_owned()),
            _ => None,
        })
        .unwrap();
        let pool = db::create_memory_pool().await.unwrap();
        prepare_database(&pool).await.unwrap();
        app(AppState::new(config, pool).unwrap())
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &serde_json::Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_prepare_database_is_idempotent() {
        let pool = db::create_memory_pool().await.unwrap();
        prepare_database(&pool).await.unwrap();
        prepare_database(&pool).await.unwrap();

        let count = db::BookRepository::new(&pool).count().await.unwrap();
        assert_eq!(count, 6);
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = test_app().await;

        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_home_shows_featured_book() {
        let response = test_app().await.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["featured"]["slug"], db::seed::FEATURED_SLUG);
        assert_eq!(body["categories"].as_array().unwrap().len(), 3);
        assert_eq!(body["cart_item_count"], 0);
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let response = test_app()
            .await
            .oneshot(get("/books?category=poetry"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_book_is_not_found() {
        let response = test_app()
            .await
            .oneshot(get("/books/9999"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_negative_quantity_is_rejected() {
        let response = test_app()
            .await
            .oneshot(post_json(
                "/cart/add",
                &serde_json::json!({ "book_id": 1, "quantity": -2 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_promo_is_unprocessable() {
        let response = test_app()
            .await
            .oneshot(post_json(
                "/cart/promo",
                &serde_json::json!({ "code": "bogus" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("BOGUS"));
    }

    #[tokio::test]
    async fn test_admin_routes_require_login() {
        let app = test_app().await;

        let response = app.clone().oneshot(get("/admin/books")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(post_json(
                "/admin/login",
                &serde_json::json!({ "password": "wrong" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_login_sets_session_cookie() {
        let response = test_app()
            .await
            .oneshot(post_json(
                "/admin/login",
                &serde_json::json!({ "password": "letmein" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with(middleware::session::SESSION_COOKIE_NAME));
    }
}
