use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("No release of channel {channel} could be resolved")]
    NoResolvableReleases { channel: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("Cannot summarize an empty release set")]
    EmptyReleaseSet,
}
