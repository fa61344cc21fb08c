//! Database operations for the `books` table.

use bookscrape_core::NormalizedBook;
use rust_decimal::Decimal;

use crate::DbError;

/// A row from the `books` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct BookRow {
    pub id: i64,
    pub url: Option<String>,
    pub title: Option<String>,
    pub upc: Option<String>,
    pub product_type: Option<String>,
    pub price_excl_tax: Option<Decimal>,
    pub price_incl_tax: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub price: Option<Decimal>,
    pub availability: Option<i32>,
    pub num_reviews: Option<i32>,
    /// `SMALLINT` constrained to `0..=5`.
    pub stars: Option<i16>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl From<BookRow> for NormalizedBook {
    fn from(row: BookRow) -> Self {
        NormalizedBook {
            url: row.url,
            title: row.title,
            upc: row.upc,
            product_type: row.product_type,
            price_excl_tax: row.price_excl_tax,
            price_incl_tax: row.price_incl_tax,
            tax: row.tax,
            price: row.price,
            availability: row.availability,
            num_reviews: row.num_reviews,
            stars: row.stars,
            category: row.category,
            description: row.description,
        }
    }
}

/// Inserts one book row and returns its generated `id`.
///
/// All thirteen business columns are written; absent fields bind as `NULL`.
/// The caller decides the transaction boundary.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_book<'e, E>(executor: E, book: &NormalizedBook) -> Result<i64, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO books \
             (url, title, upc, product_type, price_excl_tax, price_incl_tax, tax, price, \
              availability, num_reviews, stars, category, description) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, \
                 $9, $10, $11, $12, $13) \
         RETURNING id",
    )
    .bind(&book.url)
    .bind(&book.title)
    .bind(&book.upc)
    .bind(&book.product_type)
    .bind(book.price_excl_tax)
    .bind(book.price_incl_tax)
    .bind(book.tax)
    .bind(book.price)
    .bind(book.availability)
    .bind(book.num_reviews)
    .bind(book.stars)
    .bind(&book.category)
    .bind(&book.description)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Fetches a single book by `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has that `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_book<'e, E>(executor: E, id: i64) -> Result<BookRow, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, BookRow>(
        "SELECT id, url, title, upc, product_type, price_excl_tax, price_incl_tax, tax, price, \
                availability, num_reviews, stars, category, description \
         FROM books \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the number of rows in `books`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_books<'e, E>(executor: E) -> Result<i64, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books")
        .fetch_one(executor)
        .await?;
    Ok(count)
}
