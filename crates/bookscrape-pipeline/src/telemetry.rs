use tracing_subscriber::EnvFilter;

use crate::PipelineError;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to `log_level`.
///
/// # Errors
///
/// Returns [`PipelineError::Tracing`] if `log_level` is not a valid filter or a
/// global subscriber is already installed.
pub fn init_tracing(log_level: &str) -> Result<(), PipelineError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| PipelineError::Tracing(e.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| PipelineError::Tracing(e.to_string()))
}
