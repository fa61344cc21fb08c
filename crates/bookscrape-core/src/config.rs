use crate::app_config::{AppConfig, SinkConfig, SinkFailurePolicy};
use crate::ConfigError;

/// Currency markers recognized when no `BOOKSCRAPE_CURRENCY_SYMBOLS` is set.
pub const DEFAULT_CURRENCY_SYMBOLS: [&str; 4] = ["£", "$", "€", "¥"];

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u16>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("BOOKSCRAPE_LOG_LEVEL", "info");

    let sink = SinkConfig {
        host: or_default("BOOKSCRAPE_DB_HOST", "localhost"),
        port: parse_u16("BOOKSCRAPE_DB_PORT", "5432")?,
        user: require("BOOKSCRAPE_DB_USER")?,
        password: lookup("BOOKSCRAPE_DB_PASSWORD").ok(),
        database: or_default("BOOKSCRAPE_DB_NAME", "books"),
        connect_timeout_secs: parse_u64("BOOKSCRAPE_DB_CONNECT_TIMEOUT_SECS", "10")?,
        max_retries: parse_u32("BOOKSCRAPE_SINK_MAX_RETRIES", "3")?,
        retry_backoff_base_ms: parse_u64("BOOKSCRAPE_SINK_RETRY_BACKOFF_BASE_MS", "500")?,
    };

    let sink_failure_policy =
        parse_sink_failure_policy(&or_default("BOOKSCRAPE_SINK_FAILURE_POLICY", "continue"))?;

    let currency_symbols = match lookup("BOOKSCRAPE_CURRENCY_SYMBOLS") {
        Ok(raw) => parse_currency_symbols(&raw)?,
        Err(_) => DEFAULT_CURRENCY_SYMBOLS
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
    };

    Ok(AppConfig {
        log_level,
        sink,
        sink_failure_policy,
        currency_symbols,
    })
}

fn parse_sink_failure_policy(s: &str) -> Result<SinkFailurePolicy, ConfigError> {
    match s.trim().to_lowercase().as_str() {
        "continue" => Ok(SinkFailurePolicy::Continue),
        "abort" => Ok(SinkFailurePolicy::Abort),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BOOKSCRAPE_SINK_FAILURE_POLICY".to_string(),
            reason: format!("expected \"continue\" or \"abort\", got \"{other}\""),
        }),
    }
}

/// Splits a comma-separated symbol list, dropping blanks.
fn parse_currency_symbols(raw: &str) -> Result<Vec<String>, ConfigError> {
    let symbols: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if symbols.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "BOOKSCRAPE_CURRENCY_SYMBOLS".to_string(),
            reason: "no currency symbols listed".to_string(),
        });
    }
    Ok(symbols)
}
