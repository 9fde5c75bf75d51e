//! Admin book CRUD.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use book_nook_core::{Book, BookDraft, BookId};

use crate::db::{BookRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

fn not_found(id: BookId) -> AppError {
    AppError::NotFound(format!("Book {id} not found"))
}

/// GET /admin/books
#[instrument(skip_all)]
pub async fn index(_admin: RequireAdmin, State(state): State<AppState>) -> Result<Json<Vec<Book>>> {
    Ok(Json(BookRepository::new(state.pool()).list(None).await?))
}

/// POST /admin/books
#[instrument(skip_all)]
pub async fn create(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(draft): Json<BookDraft>,
) -> Result<(StatusCode, Json<Book>)> {
    let input = draft.validate()?;
    let book = BookRepository::new(state.pool()).create(&input).await?;

    tracing::info!(book_id = %book.id, slug = %book.slug, "Book created");
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /admin/books/{id}
#[instrument(skip(_admin, state))]
pub async fn show(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Book>> {
    let id = BookId::new(id);
    BookRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// PUT /admin/books/{id}
#[instrument(skip(_admin, state, draft))]
pub async fn update(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<BookDraft>,
) -> Result<Json<Book>> {
    let id = BookId::new(id);
    let input = draft.validate()?;

    match BookRepository::new(state.pool()).update(id, &input).await {
        Ok(book) => {
            tracing::info!(book_id = %id, "Book updated");
            Ok(Json(book))
        }
        Err(RepositoryError::NotFound) => Err(not_found(id)),
        Err(e) => Err(e.into()),
    }
}

/// DELETE /admin/books/{id}
///
/// Books that appear on past orders cannot be deleted (409).
#[instrument(skip(_admin, state))]
pub async fn destroy(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let id = BookId::new(id);

    match BookRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            tracing::info!(book_id = %id, "Book deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(RepositoryError::NotFound) => Err(not_found(id)),
        Err(e) => Err(e.into()),
    }
}
