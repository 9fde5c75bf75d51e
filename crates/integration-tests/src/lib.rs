//! Integration tests for Book Nook.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p book-nook-integration-tests
//! ```
//!
//! Every [`TestContext`] boots a storefront on an ephemeral port backed by
//! a fresh in-memory database seeded with the demo catalog. Clients keep
//! cookies, so each client is one shopper session.

use book_nook_core::{Book, BookId};
use book_nook_storefront::config::StorefrontConfig;
use book_nook_storefront::db::{self, BookRepository};
use book_nook_storefront::state::AppState;
use book_nook_storefront::{app, prepare_database};
use reqwest::Client;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;

/// Admin password configured for test servers.
pub const ADMIN_PASSWORD: &str = "integration-secret";

/// A running storefront plus direct database access for assertions.
pub struct TestContext {
    pub base_url: String,
    pub pool: SqlitePool,
    server: JoinHandle<()>,
}

impl TestContext {
    /// Start a storefront with a freshly seeded catalog.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn new() -> Self {
        let config = StorefrontConfig::from_lookup(|key| match key {
            "ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_owned()),
            _ => None,
        })
        .expect("Failed to build test configuration");

        let pool = db::create_memory_pool()
            .await
            .expect("Failed to create database pool");
        prepare_database(&pool)
            .await
            .expect("Failed to prepare database");

        let state = AppState::new(config, pool.clone()).expect("Failed to build state");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let server = tokio::spawn(async move {
            axum::serve(listener, app(state))
                .await
                .expect("Test server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            pool,
            server,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A new shopper session.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// A session logged in to the admin panel.
    ///
    /// # Panics
    ///
    /// Panics if the login is rejected.
    pub async fn admin_client(&self) -> Client {
        let client = self.client();
        let resp = client
            .post(self.url("/admin/login"))
            .json(&json!({ "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);
        client
    }

    /// Look up a seeded book by slug.
    ///
    /// # Panics
    ///
    /// Panics if the book does not exist.
    pub async fn book(&self, slug: &str) -> Book {
        BookRepository::new(&self.pool)
            .get_by_slug(slug)
            .await
            .expect("Failed to query book")
            .expect("Book not found")
    }

    /// Current stock for a book, read straight from the database.
    ///
    /// # Panics
    ///
    /// Panics if the book does not exist.
    pub async fn stock_of(&self, id: BookId) -> u32 {
        BookRepository::new(&self.pool)
            .get(id)
            .await
            .expect("Failed to query book")
            .expect("Book not found")
            .stock_quantity
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// POST a JSON body and return the status and parsed response.
///
/// # Panics
///
/// Panics if the request fails or the response is not JSON.
pub async fn post_json(client: &Client, url: &str, body: &Value) -> (reqwest::StatusCode, Value) {
    let resp = client
        .post(url)
        .json(body)
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    let body = resp.json::<Value>().await.expect("Response was not JSON");
    (status, body)
}

/// GET a URL and return the status and parsed response.
///
/// # Panics
///
/// Panics if the request fails or the response is not JSON.
pub async fn get_json(client: &Client, url: &str) -> (reqwest::StatusCode, Value) {
    let resp = client.get(url).send().await.expect("Request failed");
    let status = resp.status();
    let body = resp.json::<Value>().await.expect("Response was not JSON");
    (status, body)
}
