/// What a run does after a record fails to persist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SinkFailurePolicy {
    /// Log and count the failure, then move on to the next record.
    #[default]
    Continue,
    /// Stop the run at the first failed insert.
    Abort,
}

impl std::fmt::Display for SinkFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkFailurePolicy::Continue => write!(f, "continue"),
            SinkFailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

/// Connection parameters for the Postgres sink.
#[derive(Clone)]
pub struct SinkConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub connect_timeout_secs: u64,
    /// Extra attempts for an insert that failed with a transient error.
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("database", &self.database)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub sink: SinkConfig,
    pub sink_failure_policy: SinkFailurePolicy,
    /// Markers stripped from price text before decimal parsing.
    pub currency_symbols: Vec<String>,
}
