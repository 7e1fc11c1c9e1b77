use thiserror::Error;

#[derive(Error, Debug)]
pub enum StaywatchError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<chromiumoxide::error::CdpError> for StaywatchError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        StaywatchError::Browser(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StaywatchError>;
