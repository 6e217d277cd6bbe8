//! Release reconciliation and release metadata
//!
//! # Modules
//!
//! - [`reconciler`]: Publishing history to one release per logical version
//! - [`summary`]: Channel summary (latest release, security)
//! - [`cve`]: CVE extraction from changelog text
//! - [`model`]: `releases-index.json` / `releases.json` model
//! - [`error`]: Reconciliation and summary errors

pub mod cve;
pub mod error;
pub mod model;
pub mod reconciler;
pub mod summary;

pub use cve::{Cve, extract_cves};
pub use error::{ReconcileError, SummaryError};
pub use model::{Channel, ChannelDetails, Index, Release, ReleaseSupportPhase, ReleaseType};
pub use reconciler::{
    Diagnostic, ReconciledRelease, Reconciliation, ReconcilerOptions, ReleaseReconciler,
};
pub use summary::{ChannelSummary, summarize};
