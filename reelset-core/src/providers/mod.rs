pub mod rate_limit;
pub mod tmdb;

pub use rate_limit::{RateLimitGate, RateLimitWindow};
pub use tmdb::{TmdbProvider, TmdbSettings};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}
