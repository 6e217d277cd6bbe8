//! Ubuntu archive access
//!
//! Everything the reconciler needs from outside its inputs goes through the
//! two collaborator traits defined here:
//! - [`changelog::ChangelogFetcher`]: changelog text of a publication
//! - [`inspection::VersionInspector`]: product versions read from artifacts
//!
//! # Modules
//!
//! - [`types`]: Publishing history records
//! - [`changelog`]: Changelog fetcher trait and Debian changelog parsing
//! - [`launchpad`]: HTTP changelog fetcher for the Launchpad API
//! - [`inspection`]: `.version` file based inspector
//! - [`error`]: Fetch and resolution errors

pub mod changelog;
pub mod error;
pub mod inspection;
pub mod launchpad;
pub mod types;

pub use changelog::{ChangelogEntry, ChangelogFetcher, parse_latest_entry};
pub use error::{FetchError, ResolutionError};
pub use inspection::{
    DotVersionFile, ExtractedTreeInspector, NoInspection, ResolvedVersions, VersionInspector,
};
pub use launchpad::HttpChangelogFetcher;
pub use types::{ArchivePocket, PublishingStatus, RawPublicationRecord, parse_records};
