use thiserror::Error;

#[derive(Error, Debug)]
pub enum CiHealthError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication rejected by CI API (status {status})")]
    Unauthorized { status: u16 },

    #[error("CI API rate limit exhausted (status {status}): {message}")]
    RateLimited { status: u16, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CiHealthError {
    /// Whether this error came from talking to the CI API.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Unauthorized { .. }
                | Self::RateLimited { .. }
                | Self::NotFound(_)
                | Self::Api { .. }
                | Self::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CiHealthError>;
