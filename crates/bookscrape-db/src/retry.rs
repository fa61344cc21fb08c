//! Retry with exponential back-off and jitter for sink connections and inserts.
//!
//! Only transient failures are retried: dropped sockets, connect timeouts and
//! Postgres connection-class errors. Constraint violations, bad SQL and
//! migration failures are returned immediately since repeating them cannot
//! succeed.

use std::future::Future;
use std::time::Duration;

use crate::DbError;

const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`DbError::ConnectTimeout`]: server slow to accept.
/// - I/O and pool-timeout errors from `sqlx`.
/// - Database errors with SQLSTATE class `08` (connection exception),
///   `40001` (serialization failure), `40P01` (deadlock) or `57P01`
///   (admin shutdown).
///
/// **Not retriable:** [`DbError::NotFound`], [`DbError::Migration`] and every
/// other `sqlx` error.
pub(crate) fn is_retriable(err: &DbError) -> bool {
    match err {
        DbError::ConnectTimeout { .. }
        | DbError::Sqlx(sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut) => true,
        DbError::Sqlx(sqlx::Error::Database(db_err)) => db_err
            .code()
            .is_some_and(|code| is_transient_sqlstate(&code)),
        DbError::Sqlx(_) | DbError::NotFound | DbError::Migration(_) => false,
    }
}

fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "40001" | "40P01" | "57P01")
}

/// Delay before retry number `attempt` (1-based): `base × 2^(attempt-1)`,
/// capped at 30 s, with ±25 % jitter.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    let exponent = attempt.saturating_sub(1).min(10);
    let computed = backoff_base_ms.saturating_mul(1u64 << exponent);
    let capped = computed.min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

/// Retry budget for one operation.
///
/// Owns the policy: which errors are retried, how many times, and how long
/// to wait between attempts.
#[derive(Debug)]
pub(crate) struct Backoff {
    max_retries: u32,
    backoff_base_ms: u64,
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
            attempt: 0,
        }
    }

    /// Sleeps before the next attempt after `err`.
    ///
    /// Returns `false` without sleeping when `err` is not transient or the
    /// retry budget is spent; the caller should then return `err`.
    pub(crate) async fn wait(&mut self, err: &DbError) -> bool {
        if !is_retriable(err) || self.attempt >= self.max_retries {
            return false;
        }
        self.attempt += 1;
        let delay_ms = backoff_delay_ms(self.backoff_base_ms, self.attempt);
        tracing::warn!(
            attempt = self.attempt,
            max_retries = self.max_retries,
            delay_ms,
            error = %err,
            "transient database error, retrying after back-off"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        true
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let mut backoff = Backoff::new(max_retries, backoff_base_ms);
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !backoff.wait(&err).await {
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn io_err() -> DbError {
        DbError::Sqlx(sqlx::Error::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )))
    }

    #[test]
    fn io_error_is_retriable() {
        assert!(is_retriable(&io_err()));
    }

    #[test]
    fn connect_timeout_is_retriable() {
        assert!(is_retriable(&DbError::ConnectTimeout { secs: 10 }));
    }

    #[test]
    fn pool_timeout_is_retriable() {
        assert!(is_retriable(&DbError::Sqlx(sqlx::Error::PoolTimedOut)));
    }

    #[test]
    fn not_found_is_not_retriable() {
        assert!(!is_retriable(&DbError::NotFound));
    }

    #[test]
    fn row_not_found_is_not_retriable() {
        assert!(!is_retriable(&DbError::Sqlx(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn transient_sqlstates() {
        assert!(is_transient_sqlstate("08006"));
        assert!(is_transient_sqlstate("08001"));
        assert!(is_transient_sqlstate("40001"));
        assert!(is_transient_sqlstate("40P01"));
        assert!(is_transient_sqlstate("57P01"));
        assert!(!is_transient_sqlstate("23505"));
        assert!(!is_transient_sqlstate("42P01"));
    }

    #[test]
    fn backoff_delay_grows_and_stays_within_jitter() {
        for attempt in 1..=4u32 {
            let nominal = 100u64 << (attempt - 1);
            let delay = backoff_delay_ms(100, attempt);
            assert!(delay >= nominal * 3 / 4, "attempt {attempt}: {delay}ms");
            assert!(delay <= nominal * 5 / 4, "attempt {attempt}: {delay}ms");
        }
    }

    #[test]
    fn backoff_delay_is_capped() {
        let delay = backoff_delay_ms(10_000, 20);
        assert!(delay <= MAX_DELAY_MS * 5 / 4);
    }

    #[test]
    fn backoff_delay_zero_base_is_zero() {
        assert_eq!(backoff_delay_ms(0, 3), 0);
    }

    #[tokio::test]
    async fn backoff_stops_after_budget() {
        let mut backoff = Backoff::new(2, 0);
        assert!(backoff.wait(&io_err()).await);
        assert!(backoff.wait(&io_err()).await);
        assert!(!backoff.wait(&io_err()).await);
    }

    #[tokio::test]
    async fn backoff_refuses_non_transient_errors() {
        let mut backoff = Backoff::new(3, 0);
        assert!(!backoff.wait(&DbError::NotFound).await);
        assert!(backoff.wait(&io_err()).await, "budget untouched by refusal");
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, DbError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err::<u32, _>(io_err())
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99, "should succeed after retries");
        assert_eq!(
            calls.load(Ordering::SeqCst),
            3,
            "should have been called 3 times (2 failures + 1 success)"
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(io_err())
            }
        })
        .await;
        assert!(matches!(result, Err(DbError::Sqlx(sqlx::Error::Io(_)))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(DbError::NotFound)
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "NotFound must not be retried");
        assert!(matches!(result, Err(DbError::NotFound)));
    }
}
