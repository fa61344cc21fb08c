use std::future::Future;

use bookscrape_core::NormalizedBook;
use bookscrape_db::{DbError, PgBookSink};

/// Destination for normalized books.
///
/// Implementations persist each book durably before resolving and return
/// the identifier they assigned to it.
pub trait BookSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn store(&mut self, book: &NormalizedBook) -> impl Future<Output = Result<i64, Self::Error>>;
}

impl BookSink for PgBookSink {
    type Error = DbError;

    fn store(&mut self, book: &NormalizedBook) -> impl Future<Output = Result<i64, DbError>> {
        PgBookSink::store(self, book)
    }
}
