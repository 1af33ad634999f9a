use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("No active session")]
    NotSignedIn,

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid backend response: {0}")]
    Parse(String),

    #[error("Record not found")]
    NotFound,

    #[error("Backend error: {code} - {message}")]
    Backend { code: String, message: String },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}
