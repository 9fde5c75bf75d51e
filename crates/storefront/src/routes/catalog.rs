//! Catalog route handlers: home page, listings, book detail and search.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use book_nook_core::{Book, BookId, Category};

use crate::db::BookRepository;
use crate::db::seed::FEATURED_SLUG;
use crate::error::{AppError, Result};
use crate::models::SessionCart;
use crate::state::AppState;

/// Category navigation entry.
#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub name: &'static str,
    pub slug: &'static str,
}

impl From<Category> for CategoryView {
    fn from(category: Category) -> Self {
        Self {
            name: category.as_str(),
            slug: category.slug(),
        }
    }
}

fn all_categories() -> Vec<CategoryView> {
    Category::ALL.into_iter().map(CategoryView::from).collect()
}

/// Home page data.
#[derive(Debug, Serialize)]
pub struct HomeView {
    pub featured: Option<Book>,
    pub categories: Vec<CategoryView>,
    pub cart_item_count: u32,
}

/// Book listing data.
#[derive(Debug, Serialize)]
pub struct BookListView {
    pub category: Option<Category>,
    pub categories: Vec<CategoryView>,
    pub books: Vec<Book>,
}

/// Search results.
#[derive(Debug, Serialize)]
pub struct SearchView {
    pub query: String,
    pub results: Vec<Book>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /
#[instrument(skip(state, session_cart))]
pub async fn home(
    State(state): State<AppState>,
    session_cart: SessionCart,
) -> Result<Json<HomeView>> {
    let featured = BookRepository::new(state.pool())
        .featured(FEATURED_SLUG)
        .await?;

    Ok(Json(HomeView {
        featured,
        categories: all_categories(),
        cart_item_count: session_cart.cart.item_count(),
    }))
}

/// GET /books?category=
#[instrument(skip(state))]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BookListView>> {
    let category = match query.category.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            raw.parse::<Category>()
                .map_err(|e| AppError::NotFound(e.to_string()))?,
        ),
        _ => None,
    };

    let books = BookRepository::new(state.pool()).list(category).await?;

    Ok(Json(BookListView {
        category,
        categories: all_categories(),
        books,
    }))
}

/// GET /books/{id}
#[instrument(skip(state))]
pub async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Book>> {
    let id = BookId::new(id);
    BookRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Book {id} not found")))
}

/// GET /search?q=
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchView>> {
    let term = query.q.trim().to_owned();
    let results = BookRepository::new(state.pool()).search(&term).await?;

    Ok(Json(SearchView {
        query: term,
        results,
    }))
}
