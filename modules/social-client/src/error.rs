use thiserror::Error;

pub type Result<T> = std::result::Result<T, SocialError>;

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Request failed after {attempts} attempts: {url} ({last_error})")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

impl From<reqwest::Error> for SocialError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SocialError::Decode(err.to_string())
        } else {
            SocialError::Network(err.to_string())
        }
    }
}
