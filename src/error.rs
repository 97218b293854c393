use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("SLACK_TOKEN environment variable not set and no --api-token given")]
    MissingToken,

    #[error("--channel is required")]
    MissingChannel,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no channel found for name {0}")]
    ChannelNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("Slack rate limit error: retry after {retry_after_secs}s")]
    SlackRateLimit { retry_after_secs: u64 },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("invalid message timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("failed to read file at {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON serialization error: {0}")]
    JsonSerialize(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("export cancelled")]
    Cancelled,
}

impl AppError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::SlackRateLimit { .. } | AppError::Http(_))
    }

    /// Delay requested by the server, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AppError::SlackRateLimit { retry_after_secs } => {
                Some(Duration::from_secs(*retry_after_secs))
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
