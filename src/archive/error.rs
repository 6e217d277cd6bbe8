use std::path::PathBuf;

use thiserror::Error;

use crate::version::error::VersionError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Artifact inspection is not available for {0}")]
    Unavailable(String),

    #[error("No .version file found under {}", .0.display())]
    MissingVersionFile(PathBuf),

    #[error("Invalid .version file {}: {reason}", path.display())]
    InvalidVersionFile { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Version(#[from] VersionError),
}
