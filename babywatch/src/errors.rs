use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("No matching monitor device found")]
    DeviceNotFound,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Transport(format!("JSON decode error: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Transport("request timed out".to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
