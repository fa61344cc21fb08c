use std::time::Duration;

use bookscrape_core::SinkConfig;
use sqlx::{postgres::PgConnectOptions, Connection, PgConnection};
use thiserror::Error;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF_BASE_MS: u64 = 500;

// Path relative to crates/bookscrape-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Connection lifecycle settings for [`PgBookSink`], separate from the
/// address and credentials in [`PgConnectOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkSettings {
    pub connect_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_base_ms: DEFAULT_RETRY_BACKOFF_BASE_MS,
        }
    }
}

impl SinkSettings {
    #[must_use]
    pub fn from_sink_config(config: &SinkConfig) -> Self {
        Self {
            connect_timeout_secs: config.connect_timeout_secs,
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("timed out after {secs}s connecting to the database")]
    ConnectTimeout { secs: u64 },
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Builds Postgres connect options from explicit sink parameters.
///
/// The password is only set when one is configured, so a `.pgpass` file or
/// `PGPASSWORD` can still supply it.
#[must_use]
pub fn connect_options(config: &SinkConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.database)
        .application_name("bookscrape");
    match &config.password {
        Some(password) => options.password(password),
        None => options,
    }
}

/// Open a single Postgres connection, giving up after `timeout`.
///
/// # Errors
///
/// Returns [`DbError::ConnectTimeout`] if the timeout elapses, or
/// [`DbError::Sqlx`] if the connection is refused or authentication fails.
pub async fn connect(options: &PgConnectOptions, timeout: Duration) -> Result<PgConnection, DbError> {
    match tokio::time::timeout(timeout, PgConnection::connect_with(options)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(DbError::ConnectTimeout {
            secs: timeout.as_secs(),
        }),
    }
}

/// Run all pending migrations on the connection.
///
/// Returns the number of migrations that were applied. Every migration is
/// written with `IF NOT EXISTS`, so running against a database that already
/// holds the schema applies nothing destructive.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(
    conn: &mut PgConnection,
) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table may not exist yet on a fresh database;
    // treat absence as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(&mut *conn)
            .await
            .unwrap_or(0);

    MIGRATOR.run(&mut *conn).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(&mut *conn)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the connection is live.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(conn)
        .await?;
    Ok(())
}


pub mod books;
mod retry;
pub mod sink;

pub use books::{count_books, get_book, insert_book, BookRow};
pub use sink::PgBookSink;
