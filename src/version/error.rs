use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Malformed version: {0:?}")]
    MalformedVersion(String),

    #[error("Malformed package version: {0:?}")]
    MalformedPackageVersion(String),
}
