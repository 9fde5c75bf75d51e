//! Book repository for catalog reads and admin writes.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use book_nook_core::{Book, BookId, BookInput, Category, Price};

use super::{RepositoryError, map_constraint, parse_count, parse_decimal};

const BOOK_COLUMNS: &str = "id, slug, title, author, category, price, stock_quantity, image";

#[derive(sqlx::FromRow)]
struct BookRow {
    id: i64,
    slug: String,
    title: String,
    author: String,
    category: String,
    price: String,
    stock_quantity: i64,
    image: Option<String>,
}

impl TryFrom<BookRow> for Book {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let category = row.category.parse::<Category>().map_err(|e| {
            RepositoryError::DataCorruption(format!("book {}: {e}", row.id))
        })?;
        let price = Price::new(parse_decimal("book.price", &row.price)?).map_err(|e| {
            RepositoryError::DataCorruption(format!("book {}: {e}", row.id))
        })?;

        Ok(Self {
            id: BookId::new(row.id),
            slug: row.slug,
            title: row.title,
            author: row.author,
            category,
            price,
            stock_quantity: parse_count("book.stock_quantity", row.stock_quantity)?,
            image: row.image,
        })
    }
}

fn into_books(rows: Vec<BookRow>) -> Result<Vec<Book>, RepositoryError> {
    rows.into_iter().map(Book::try_from).collect()
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Repository for book database operations.
pub struct BookRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BookRepository<'a> {
    /// Create a new book repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List books, optionally restricted to one category, ordered by category then title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, category: Option<Category>) -> Result<Vec<Book>, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {BOOK_COLUMNS} FROM book"));
        if let Some(category) = category {
            query.push(" WHERE category = ").push_bind(category.as_str());
        }
        query.push(" ORDER BY category, title COLLATE NOCASE, id");

        let rows = query
            .build_query_as::<BookRow>()
            .fetch_all(self.pool)
            .await?;
        into_books(rows)
    }

    /// Get a book by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM book WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(Book::try_from).transpose()
    }

    /// Get a book by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM book WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(Book::try_from).transpose()
    }

    /// Get every book whose ID is in `ids`. Unknown IDs are skipped; order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[BookId]) -> Result<Vec<Book>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {BOOK_COLUMNS} FROM book WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.as_i64());
        }
        separated.push_unseparated(")");

        let rows = query
            .build_query_as::<BookRow>()
            .fetch_all(self.pool)
            .await?;
        into_books(rows)
    }

    /// Case-insensitive substring search over title, author and category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, term: &str) -> Result<Vec<Book>, RepositoryError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, BookRow>(&format!(
            r"
            SELECT {BOOK_COLUMNS} FROM book
            WHERE title LIKE ?1 ESCAPE '\'
               OR author LIKE ?1 ESCAPE '\'
               OR category LIKE ?1 ESCAPE '\'
            ORDER BY title COLLATE NOCASE, id
            "
        ))
        .bind(like_pattern(term))
        .fetch_all(self.pool)
        .await?;
        into_books(rows)
    }

    /// The book with slug `slug`, or the first book in the catalog if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, slug: &str) -> Result<Option<Book>, RepositoryError> {
        if let Some(book) = self.get_by_slug(slug).await? {
            return Ok(Some(book));
        }

        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM book ORDER BY id LIMIT 1"
        ))
        .fetch_optional(self.pool)
        .await?;
        row.map(Book::try_from).transpose()
    }

    /// Number of books in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a new book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &BookInput) -> Result<Book, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r"
            INSERT INTO book (slug, title, author, category, price, stock_quantity, image)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {BOOK_COLUMNS}
            "
        ))
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.author)
        .bind(input.category.as_str())
        .bind(input.price.amount().to_string())
        .bind(i64::from(input.stock_quantity))
        .bind(input.image.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, &format!("slug '{}' already exists", input.slug)))?;

        Book::try_from(row)
    }

    /// Replace every editable field of a book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no book has this ID.
    /// Returns `RepositoryError::Conflict` if the new slug belongs to another book.
    pub async fn update(&self, id: BookId, input: &BookInput) -> Result<Book, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r"
            UPDATE book
            SET slug = ?, title = ?, author = ?, category = ?, price = ?,
                stock_quantity = ?, image = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING {BOOK_COLUMNS}
            "
        ))
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.author)
        .bind(input.category.as_str())
        .bind(input.price.amount().to_string())
        .bind(i64::from(input.stock_quantity))
        .bind(input.image.as_deref())
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint(e, &format!("slug '{}' already exists", input.slug)))?
        .ok_or(RepositoryError::NotFound)?;

        Book::try_from(row)
    }

    /// Delete a book that no order references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no book has this ID.
    /// Returns `RepositoryError::Conflict` if an order item references the book.
    pub async fn delete(&self, id: BookId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let referenced: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_item WHERE book_id = ?")
                .bind(id.as_i64())
                .fetch_one(&mut *tx)
                .await?;
        if referenced > 0 {
            return Err(RepositoryError::Conflict(format!(
                "book {id} is referenced by {referenced} order item(s)"
            )));
        }

        let result = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_constraint(e, &format!("book {id} is referenced by an order")))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
