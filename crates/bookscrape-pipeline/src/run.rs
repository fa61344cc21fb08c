//! Drives raw books through normalization into a sink, one record at a time.
//!
//! A record that fails to decode, normalize or store is logged with whatever
//! identifying fields it has and counted in the [`RunSummary`]; only source
//! I/O errors and an [`SinkFailurePolicy::Abort`] store failure end the run.

use std::fmt;

use bookscrape_core::{BookField, RawBook, SinkFailurePolicy};
use bookscrape_normalize::{normalize_book_with_fallbacks, NormalizeOptions};

use crate::error::{PipelineError, SourceError};
use crate::sink::BookSink;

/// Where in the pipeline a record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Decode,
    Normalize,
    Store,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Decode => write!(f, "decode"),
            FailureStage::Normalize => write!(f, "normalize"),
            FailureStage::Store => write!(f, "store"),
        }
    }
}

/// One record that did not make it into the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// 1-based position of the record in the input.
    pub record: usize,
    pub upc: Option<String>,
    pub stage: FailureStage,
    pub message: String,
}

/// Counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records pulled from the source, including undecodable ones.
    pub read: usize,
    pub stored: usize,
    /// Records dropped before reaching the sink.
    pub rejected: usize,
    pub sink_failures: usize,
    /// Stored records where at least one lenient `0` default was used.
    pub defaulted: usize,
    pub failures: Vec<RecordFailure>,
}

impl RunSummary {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, record: usize, upc: Option<String>, stage: FailureStage, message: String) {
        match stage {
            FailureStage::Store => self.sink_failures += 1,
            FailureStage::Decode | FailureStage::Normalize => self.rejected += 1,
        }
        self.failures.push(RecordFailure {
            record,
            upc,
            stage,
            message,
        });
    }
}

/// Normalizes and stores every record from `records`, in order.
///
/// # Errors
///
/// Returns [`PipelineError::Source`] if the reader itself fails, or
/// [`PipelineError::SinkAborted`] for the first store failure when `policy`
/// is [`SinkFailurePolicy::Abort`]. Decode and normalization failures never
/// end the run.
pub async fn run_pipeline<I, S>(
    records: I,
    options: &NormalizeOptions,
    sink: &mut S,
    policy: SinkFailurePolicy,
) -> Result<RunSummary, PipelineError>
where
    I: IntoIterator<Item = Result<RawBook, SourceError>>,
    S: BookSink,
{
    let mut summary = RunSummary::default();

    for item in records {
        summary.read += 1;
        let record = summary.read;

        let raw = match item {
            Ok(raw) => raw,
            Err(SourceError::Io(source)) => {
                tracing::error!(
                    record,
                    stored = summary.stored,
                    error = %source,
                    "raw record source failed, ending run"
                );
                return Err(PipelineError::Source {
                    stored: summary.stored,
                    source,
                });
            }
            Err(err @ SourceError::Decode { .. }) => {
                tracing::warn!(record, error = %err, "skipping undecodable record");
                summary.fail(record, None, FailureStage::Decode, err.to_string());
                continue;
            }
        };

        let upc = field_text(&raw, BookField::Upc);

        let outcome = match normalize_book_with_fallbacks(&raw, options) {
            Ok(outcome) => outcome,
            Err(err) => {
                let url = field_text(&raw, BookField::Url);
                let title = field_text(&raw, BookField::Title);
                tracing::warn!(
                    record,
                    upc = upc.as_deref().unwrap_or("-"),
                    url = url.as_deref().unwrap_or("-"),
                    title = title.as_deref().unwrap_or("-"),
                    field = %err.field(),
                    error = %err,
                    "rejected malformed book"
                );
                summary.fail(record, upc, FailureStage::Normalize, err.to_string());
                continue;
            }
        };

        for fallback in &outcome.fallbacks {
            tracing::debug!(
                record,
                upc = upc.as_deref().unwrap_or("-"),
                field = %fallback.field(),
                "unstructured value defaulted to 0"
            );
        }

        match sink.store(&outcome.book).await {
            Ok(id) => {
                summary.stored += 1;
                if !outcome.fallbacks.is_empty() {
                    summary.defaulted += 1;
                }
                tracing::debug!(record, id, "stored book");
            }
            Err(err) => {
                tracing::error!(
                    record,
                    upc = upc.as_deref().unwrap_or("-"),
                    error = %err,
                    "failed to store book"
                );
                if policy == SinkFailurePolicy::Abort {
                    tracing::error!(record, stored = summary.stored, "aborting run");
                    return Err(PipelineError::SinkAborted {
                        record,
                        stored: summary.stored,
                        source: Box::new(err),
                    });
                }
                summary.fail(record, upc, FailureStage::Store, err.to_string());
            }
        }
    }

    tracing::info!(
        read = summary.read,
        stored = summary.stored,
        rejected = summary.rejected,
        sink_failures = summary.sink_failures,
        defaulted = summary.defaulted,
        "run finished"
    );

    Ok(summary)
}

/// Trimmed text of an identifying field, for log lines.
fn field_text(raw: &RawBook, field: BookField) -> Option<String> {
    raw.get(field)
        .map(|value| value.to_string().trim().to_owned())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use bookscrape_core::RawValue;

    use super::*;

    #[test]
    fn field_text_trims_and_drops_blank() {
        let raw = RawBook {
            upc: Some(RawValue::text("  a897fe39b1053632 ")),
            title: Some(RawValue::text("   ")),
            ..RawBook::default()
        };
        assert_eq!(
            field_text(&raw, BookField::Upc).as_deref(),
            Some("a897fe39b1053632")
        );
        assert!(field_text(&raw, BookField::Title).is_none());
        assert!(field_text(&raw, BookField::Url).is_none());
    }

    #[test]
    fn summary_fail_counts_by_stage() {
        let mut summary = RunSummary::default();
        summary.fail(1, None, FailureStage::Decode, "bad json".into());
        summary.fail(2, Some("x".into()), FailureStage::Normalize, "bad price".into());
        summary.fail(3, None, FailureStage::Store, "connection reset".into());
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.sink_failures, 1);
        assert_eq!(summary.failures.len(), 3);
        assert!(!summary.is_clean());
    }

    #[test]
    fn failure_stage_display() {
        assert_eq!(FailureStage::Normalize.to_string(), "normalize");
    }
}
