use thiserror::Error;

#[derive(Error, Debug)]
pub enum QaError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid section pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<config::ConfigError> for QaError {
    fn from(err: config::ConfigError) -> Self {
        QaError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for QaError {
    fn from(err: serde_json::Error) -> Self {
        QaError::ParsingError(err.to_string())
    }
}

impl From<anyhow::Error> for QaError {
    fn from(err: anyhow::Error) -> Self {
        QaError::Unknown(err.to_string())
    }
}
