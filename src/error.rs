use thiserror::Error;

/// Failure modes of a single page fetch. Both variants are recoverable:
/// the scheduler surfaces them to the renderer and retries at the same
/// offset on the next tick. Neither touches accumulated state.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or database error, including timeouts and non-2xx responses.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The source answered, but the payload does not parse into records.
    #[error("source data invalid: {0}")]
    SourceDataInvalid(String),
}

impl FetchError {
    /// Stable kind tag for log records and the render error flag.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::SourceUnavailable(_) => "source_unavailable",
            FetchError::SourceDataInvalid(_) => "source_data_invalid",
        }
    }
}

/// Startup configuration failures. Fatal: the process must halt with a
/// clear message before the first render, never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
