use thiserror::Error;

/// Errors that end a run. Per-record failures are collected in
/// [`crate::RunSummary`] instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to open book sink: {0}")]
    SinkOpen(#[source] bookscrape_db::DbError),

    #[error("aborting run: record {record} could not be stored ({stored} already stored): {source}")]
    SinkAborted {
        record: usize,
        /// Books committed before the run stopped.
        stored: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to read raw records ({stored} already stored): {source}")]
    Source {
        stored: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialise tracing: {0}")]
    Tracing(String),
}

impl PipelineError {
    /// Books committed before a run-ending error, when the run got that far.
    #[must_use]
    pub fn stored(&self) -> Option<usize> {
        match self {
            PipelineError::SinkAborted { stored, .. } | PipelineError::Source { stored, .. } => {
                Some(*stored)
            }
            PipelineError::SinkOpen(_) | PipelineError::Tracing(_) => None,
        }
    }
}

/// A line of input that could not be turned into a raw book.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid raw book json: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
