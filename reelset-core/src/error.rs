use std::path::PathBuf;

use thiserror::Error;

use crate::providers::ProviderError;

#[derive(Error, Debug)]
pub enum MediaServerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media server returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("invalid media server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to read local poster {path}")]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected media server payload: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to fingerprint {path}")]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Media server error: {0}")]
    MediaServer(#[from] MediaServerError),

    #[error("Metadata provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("no poster upload succeeded for collection {collection}")]
    UploadFailed { collection: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;
