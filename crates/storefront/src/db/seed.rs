//! Demo catalog inserted into an empty database.

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::instrument;

use book_nook_core::BookDraft;

use super::{BookRepository, RepositoryError};

/// Slug of the book shown on the home page.
pub const FEATURED_SLUG: &str = "sapiens";

/// Stock each demo book starts with.
const SEED_STOCK: i64 = 10;

const SEED_BOOKS: &[(&str, &str, &str, i64, &str)] = &[
    (
        "Where the Wild Things Are",
        "Maurice Sendak",
        "Children's",
        799,
        "images/where-the-wild-things-are.jpg",
    ),
    (
        "The Very Hungry Caterpillar",
        "Eric Carle",
        "Children's",
        799,
        "images/the-very-hungry-caterpillar.jpg",
    ),
    (
        "The Phantom Tollbooth",
        "Norton Juster",
        "Fiction",
        899,
        "images/the-phantom-tollbooth.jpg",
    ),
    ("Caroline", "Neil Gaiman", "Fiction", 899, "images/caroline.jpg"),
    (
        "Sapiens",
        "Yuval Noah Harari",
        "Non-Fiction",
        999,
        "images/sapiens.jpg",
    ),
    (
        "Atomic Habits",
        "James Carter",
        "Non-Fiction",
        999,
        "images/atomic-habits.jpg",
    ),
];

/// Insert the demo catalog if the `book` table is empty.
///
/// Returns the number of books inserted.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails.
#[instrument(skip(pool))]
pub async fn seed_catalog(pool: &SqlitePool) -> Result<usize, RepositoryError> {
    let books = BookRepository::new(pool);
    if books.count().await? > 0 {
        return Ok(0);
    }

    for &(title, author, category, cents, image) in SEED_BOOKS {
        let input = BookDraft {
            title: title.to_owned(),
            author: author.to_owned(),
            category: category.to_owned(),
            price: Decimal::new(cents, 2),
            stock_quantity: SEED_STOCK,
            slug: None,
            image: Some(image.to_owned()),
        }
        .validate()
        .map_err(|e| RepositoryError::DataCorruption(format!("seed book {title:?}: {e}")))?;

        books.create(&input).await?;
    }

    tracing::info!(count = SEED_BOOKS.len(), "Seeded demo catalog");
    Ok(SEED_BOOKS.len())
}
