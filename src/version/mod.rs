//! Version identity layer
//!
//! Parses and orders the two version grammars involved in publishing .NET
//! through the Ubuntu archive.
//!
//! # Architecture
//!
//! ```text
//! "8.0.100-8.0.0~rc2-0ubuntu2~22.04.1"
//!        │                        │
//!        ▼                        ▼
//! ┌──────────────┐         ┌─────────────┐
//! │   package    │         │    dpkg     │
//! │ (decompose)  │         │ (raw order) │
//! └──────────────┘         └─────────────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   product    │  8.0.100-rc.2 / 8.0.0-rc.2
//! │ (parse, cmp) │
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`product`]: Upstream product version (`8.0.0`, `9.0.0-preview.7`)
//! - [`package`]: Source package version decomposition and reconstruction
//! - [`dpkg`]: Debian version ordering over raw package version strings
//! - [`error`]: Parse errors

pub mod dpkg;
pub mod error;
pub mod package;
pub mod product;

pub use dpkg::{DebianVersion, compare_versions};
pub use error::VersionError;
pub use package::{LogicalIdentity, PackageVersionIdentity, RuntimeGrain};
pub use product::{Prerelease, PrereleaseKind, ProductVersion};
