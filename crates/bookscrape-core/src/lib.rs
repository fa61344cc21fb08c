pub mod app_config;
pub mod books;
pub mod config;

use thiserror::Error;

pub use app_config::{AppConfig, SinkConfig, SinkFailurePolicy};
pub use books::{BookField, NormalizedBook, RawBook, RawValue};
pub use config::{load_app_config, load_app_config_from_env, DEFAULT_CURRENCY_SYMBOLS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
