//! Runs scraped book items through normalization into the Postgres sink.

pub mod error;
pub mod run;
pub mod sink;
pub mod source;
pub mod telemetry;

use std::io::BufRead;

use bookscrape_core::{AppConfig, SinkFailurePolicy};
use bookscrape_db::{connect_options, PgBookSink, SinkSettings};
use bookscrape_normalize::NormalizeOptions;
use sqlx::postgres::PgConnectOptions;

pub use error::{PipelineError, SourceError};
pub use run::{run_pipeline, FailureStage, RecordFailure, RunSummary};
pub use sink::BookSink;
pub use source::JsonLinesSource;
pub use telemetry::init_tracing;

/// Opens the configured sink, stores every JSON Lines record from `input`,
/// then closes the sink.
///
/// # Errors
///
/// See [`run_with_connect_options`].
pub async fn run_from_config<R: BufRead>(
    config: &AppConfig,
    input: R,
) -> Result<RunSummary, PipelineError> {
    run_with_connect_options(
        connect_options(&config.sink),
        SinkSettings::from_sink_config(&config.sink),
        &NormalizeOptions::from_app_config(config),
        config.sink_failure_policy,
        input,
    )
    .await
}

/// Opens a [`PgBookSink`] with prepared connect options, stores every JSON
/// Lines record from `input`, then closes the sink.
///
/// # Errors
///
/// Returns [`PipelineError::SinkOpen`] if the sink cannot be opened; no
/// records are read in that case. Otherwise returns whatever
/// [`run_pipeline`] returns. A failed close is logged, not returned.
pub async fn run_with_connect_options<R: BufRead>(
    options: PgConnectOptions,
    settings: SinkSettings,
    normalize: &NormalizeOptions,
    policy: SinkFailurePolicy,
    input: R,
) -> Result<RunSummary, PipelineError> {
    let mut sink = PgBookSink::open_with(options, settings)
        .await
        .map_err(PipelineError::SinkOpen)?;

    let result = run_pipeline(JsonLinesSource::new(input), normalize, &mut sink, policy).await;

    if let Err(err) = sink.close().await {
        tracing::warn!(error = %err, "book sink did not close cleanly");
    }

    result
}
