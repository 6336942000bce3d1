use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Missing required configuration: {0} is not set")]
    MissingConfig(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Container engine error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("Container engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashError {
    /// Configuration errors fail the whole request instead of a single section.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingConfig(_) | Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
