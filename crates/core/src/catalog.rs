//! Catalog books and the validated input used to create or edit them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{BookId, Category, Price};

/// Maximum title length accepted from the admin panel.
pub const MAX_TITLE_LENGTH: usize = 200;
/// Maximum author length accepted from the admin panel.
pub const MAX_AUTHOR_LENGTH: usize = 120;
/// Maximum slug length.
pub const MAX_SLUG_LENGTH: usize = 120;

/// A book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    /// URL-friendly unique handle.
    pub slug: String,
    pub title: String,
    pub author: String,
    pub category: Category,
    /// Current unit price. Orders copy this value at checkout.
    pub price: Price,
    pub stock_quantity: u32,
    /// Optional path of a cover image under the static directory.
    pub image: Option<String>,
}

impl Book {
    /// Whether `quantity` units can currently be sold.
    #[must_use]
    pub const fn has_stock_for(&self, quantity: u32) -> bool {
        quantity <= self.stock_quantity
    }
}

/// Validation failures for book input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookError {
    #[error("title is required")]
    MissingTitle,
    #[error("author is required")]
    MissingAuthor,
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("slug may only contain lowercase letters, digits and hyphens")]
    InvalidSlug,
    #[error(transparent)]
    Category(#[from] crate::types::CategoryError),
    #[error(transparent)]
    Price(#[from] crate::types::PriceError),
    #[error("stock quantity must be between 0 and {max} (got {got})")]
    Stock { got: i64, max: u32 },
}

/// Unvalidated book fields as submitted to the admin panel.
///
/// Numeric fields are kept wide so that negative values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Book fields that passed validation and can be written to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInput {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub category: Category,
    pub price: Price,
    pub stock_quantity: u32,
    pub image: Option<String>,
}

impl BookDraft {
    /// Trim and validate the draft.
    ///
    /// A blank slug is derived from the title.
    ///
    /// # Errors
    ///
    /// Returns the first `BookError` encountered.
    pub fn validate(self) -> Result<BookInput, BookError> {
        let title = required(&self.title, "title", MAX_TITLE_LENGTH, BookError::MissingTitle)?;
        let author = required(
            &self.author,
            "author",
            MAX_AUTHOR_LENGTH,
            BookError::MissingAuthor,
        )?;
        let category = self.category.parse()?;
        let price = Price::new(self.price)?;
        let stock_quantity = u32::try_from(self.stock_quantity).map_err(|_| BookError::Stock {
            got: self.stock_quantity,
            max: u32::MAX,
        })?;

        let slug = match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_owned(),
            _ => slugify(&title),
        };
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(BookError::InvalidSlug);
        }
        if slug.len() > MAX_SLUG_LENGTH {
            return Err(BookError::TooLong {
                field: "slug",
                max: MAX_SLUG_LENGTH,
            });
        }

        let image = self
            .image
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());

        Ok(BookInput {
            slug,
            title,
            author,
            category,
            price,
            stock_quantity,
            image,
        })
    }
}

fn required(
    value: &str,
    field: &'static str,
    max: usize,
    missing: BookError,
) -> Result<String, BookError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(missing);
    }
    if value.chars().count() > max {
        return Err(BookError::TooLong { field, max });
    }
    Ok(value.to_owned())
}

/// Derive a slug from a title: lowercase ASCII alphanumerics joined by hyphens.
///
/// ```
/// use book_nook_core::catalog::slugify;
///
/// assert_eq!(slugify("Where the Wild Things Are"), "where-the-wild-things-are");
/// assert_eq!(slugify("Children's  Tales!"), "childrens-tales");
/// ```
#[must_use]
pub fn slugify(title: &str) -> String {
    title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::types::{MAX_PRICE, PriceError};

    fn draft() -> BookDraft {
        BookDraft {
            title: "  The Phantom Tollbooth ".to_owned(),
            author: "Norton Juster".to_owned(),
            category: "fiction".to_owned(),
            price: dec!(8.99),
            stock_quantity: 4,
            slug: None,
            image: Some("   ".to_owned()),
        }
    }

    #[test]
    fn test_validate_trims_and_derives_slug() {
        let input = draft().validate().unwrap();
        assert_eq!(input.title, "The Phantom Tollbooth");
        assert_eq!(input.slug, "the-phantom-tollbooth");
        assert_eq!(input.category, Category::Fiction);
        assert_eq!(input.stock_quantity, 4);
        assert_eq!(input.image, None);
    }

    #[test]
    fn test_validate_keeps_explicit_slug() {
        let input = BookDraft {
            slug: Some("tollbooth".to_owned()),
            ..draft()
        }
        .validate()
        .unwrap();
        assert_eq!(input.slug, "tollbooth");
    }

    #[test]
    fn test_validate_rejects_bad_slug() {
        let err = BookDraft {
            slug: Some("Not A Slug".to_owned()),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, BookError::InvalidSlug);
    }

    #[test]
    fn test_validate_rejects_negative_price_and_stock() {
        let err = BookDraft {
            price: dec!(-1),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, BookError::Price(_)));

        let err = BookDraft {
            stock_quantity: -3,
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, BookError::Stock { got: -3, .. }));
    }

    #[test]
    fn test_validate_rejects_oversized_and_sub_cent_prices() {
        for price in [Decimal::MAX, dec!(1000000.01)] {
            let err = BookDraft { price, ..draft() }.validate().unwrap_err();
            assert!(matches!(err, BookError::Price(PriceError::TooLarge(_))));
        }

        let err = BookDraft {
            price: dec!(9.995),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            BookError::Price(PriceError::FractionalCents(_))
        ));

        let input = BookDraft {
            price: MAX_PRICE,
            ..draft()
        }
        .validate()
        .unwrap();
        assert_eq!(input.price.amount(), MAX_PRICE);
    }

    #[test]
    fn test_validate_requires_title_author_category() {
        let err = BookDraft {
            title: "   ".to_owned(),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, BookError::MissingTitle);

        let err = BookDraft {
            author: String::new(),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, BookError::MissingAuthor);

        let err = BookDraft {
            category: "Poetry".to_owned(),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, BookError::Category(_)));
    }

    #[test]
    fn test_has_stock_for() {
        let book = Book {
            id: BookId::new(1),
            slug: "sapiens".to_owned(),
            title: "Sapiens".to_owned(),
            author: "Yuval Noah Harari".to_owned(),
            category: Category::NonFiction,
            price: Price::new(dec!(9.99)).unwrap(),
            stock_quantity: 2,
            image: None,
        };
        assert!(book.has_stock_for(2));
        assert!(!book.has_stock_for(3));
    }
}
