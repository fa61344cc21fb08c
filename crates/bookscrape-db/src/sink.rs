//! Single-connection Postgres sink for normalized books.

use bookscrape_core::{NormalizedBook, SinkConfig};
use sqlx::{postgres::PgConnectOptions, Connection, PgConnection};

use crate::books::insert_book;
use crate::retry::{retry_with_backoff, Backoff};
use crate::{connect, connect_options, run_migrations, DbError, SinkSettings};

/// Owns one long-lived connection and writes one book per transaction.
///
/// `store` takes `&mut self`, so writes through a sink are always serialized.
pub struct PgBookSink {
    conn: PgConnection,
    options: PgConnectOptions,
    settings: SinkSettings,
}

impl std::fmt::Debug for PgBookSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgBookSink")
            .field("host", &self.options.get_host())
            .field("database", &self.options.get_database())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PgBookSink {
    /// Connects using explicit sink parameters and ensures the `books` table exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection cannot be established within the
    /// configured retries or if the schema bootstrap fails.
    pub async fn open(config: &SinkConfig) -> Result<Self, DbError> {
        Self::open_with(connect_options(config), SinkSettings::from_sink_config(config)).await
    }

    /// Connects with prepared options and ensures the `books` table exists.
    ///
    /// Schema bootstrap is create-if-absent: an existing table and its rows
    /// are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if connecting or migrating fails.
    pub async fn open_with(
        options: PgConnectOptions,
        settings: SinkSettings,
    ) -> Result<Self, DbError> {
        let timeout = settings.connect_timeout();
        let mut conn = retry_with_backoff(settings.max_retries, settings.retry_backoff_base_ms, || {
            connect(&options, timeout)
        })
        .await?;

        let applied = run_migrations(&mut conn).await?;
        tracing::info!(
            host = options.get_host(),
            database = options.get_database().unwrap_or_default(),
            applied,
            "book sink ready"
        );

        Ok(Self {
            conn,
            options,
            settings,
        })
    }

    /// Inserts one book and commits it before returning the new row `id`.
    ///
    /// Transient failures reconnect and retry with back-off. An insert whose
    /// commit acknowledgement was lost may be written twice; the table has
    /// no natural key to deduplicate on.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] once retries are exhausted or on the first
    /// non-transient failure. The book is not persisted in that case.
    pub async fn store(&mut self, book: &NormalizedBook) -> Result<i64, DbError> {
        let mut backoff =
            Backoff::new(self.settings.max_retries, self.settings.retry_backoff_base_ms);
        loop {
            match insert_committed(&mut self.conn, book).await {
                Ok(id) => return Ok(id),
                Err(err) => {
                    if !backoff.wait(&err).await {
                        return Err(err);
                    }
                    self.reconnect().await;
                }
            }
        }
    }

    /// Verifies the connection is still live.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the round-trip fails.
    pub async fn health_check(&mut self) -> Result<(), DbError> {
        crate::ping(&mut self.conn).await?;
        Ok(())
    }

    /// Closes the connection after the last record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the terminate handshake fails.
    pub async fn close(self) -> Result<(), DbError> {
        self.conn.close().await?;
        Ok(())
    }

    async fn reconnect(&mut self) {
        match connect(&self.options, self.settings.connect_timeout()).await {
            Ok(conn) => self.conn = conn,
            Err(err) => tracing::warn!(error = %err, "reconnect failed, keeping previous connection"),
        }
    }
}

async fn insert_committed(conn: &mut PgConnection, book: &NormalizedBook) -> Result<i64, DbError> {
    let mut tx = conn.begin().await?;
    let id = insert_book(&mut *tx, book).await?;
    tx.commit().await?;
    Ok(id)
}
