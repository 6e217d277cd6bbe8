//! Release reconciliation
//!
//! Turns the publishing history of one channel into one release per logical
//! (SDK, runtime) version:
//!
//! 1. Drop unpublished records and records still in the Proposed pocket
//! 2. Decompose the package versions; versions outside the grammar are
//!    resolved from the artifacts or dropped
//! 3. Group re-publications of the same logical version
//! 4. Pick the representative of each group
//! 5. Classify security from the representative's pocket
//! 6. Resolve product versions, inspecting artifacts only for pre-release
//!    uploads that encode no runtime grain
//! 7. Scan the latest changelog entry for CVEs, which confirm security
//!
//! Record and group failures never abort the pass; they are logged and
//! reported as [`Diagnostic`]s.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::archive::changelog::{ChangelogFetcher, parse_latest_entry};
use crate::archive::inspection::{ResolvedVersions, VersionInspector};
use crate::archive::types::{ArchivePocket, RawPublicationRecord};
use crate::release::cve::{Cve, extract_cves};
use crate::release::error::ReconcileError;
use crate::version::dpkg::DebianVersion;
use crate::version::package::{LogicalIdentity, PackageVersionIdentity};
use crate::version::product::ProductVersion;

/// One logical release of a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledRelease {
    /// Runtime version when known, SDK version otherwise
    pub version: ProductVersion,
    pub sdk: ProductVersion,
    pub runtime: Option<ProductVersion>,
    pub aspnetcore_runtime: Option<ProductVersion>,
    pub release_date: NaiveDate,
    pub security: bool,
    pub cves: Vec<Cve>,
    /// The publication the release was derived from
    pub provenance: RawPublicationRecord,
}

/// Non-fatal finding of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Unpublished { version: String },
    Proposed { version: String },
    MalformedVersion { version: String, reason: String },
    UnresolvedVersions { version: String, reason: String },
    ChangelogUnavailable { version: String, reason: String },
    ChangelogUnreadable { version: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Unpublished { version } => write!(f, "{}: not published", version),
            Diagnostic::Proposed { version } => write!(f, "{}: still in proposed", version),
            Diagnostic::MalformedVersion { version, reason } => {
                write!(f, "{}: cannot decompose ({})", version, reason)
            }
            Diagnostic::UnresolvedVersions { version, reason } => {
                write!(f, "{}: cannot resolve product versions ({})", version, reason)
            }
            Diagnostic::ChangelogUnavailable { version, reason } => {
                write!(f, "{}: changelog unavailable ({})", version, reason)
            }
            Diagnostic::ChangelogUnreadable { version } => {
                write!(f, "{}: changelog has no readable entry", version)
            }
        }
    }
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// One release per logical version, newest package version first
    pub releases: Vec<ReconciledRelease>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Fetch changelogs to extract CVEs. Disabled, security comes from the
    /// pocket alone.
    pub scan_changelogs: bool,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            scan_changelogs: true,
        }
    }
}

/// How the product versions of a candidate are known
enum Versions {
    /// Decomposed from the package version
    Decomposed(PackageVersionIdentity),
    /// Read from the artifacts of a package version outside the grammar
    Inspected(ResolvedVersions),
}

struct Candidate<'a> {
    record: &'a RawPublicationRecord,
    package_version: DebianVersion,
    published_at: DateTime<Utc>,
    versions: Versions,
}

impl Candidate<'_> {
    fn logical_identity(&self) -> LogicalIdentity {
        match &self.versions {
            Versions::Decomposed(identity) => identity.logical_identity(),
            Versions::Inspected(resolved) => LogicalIdentity {
                sdk: resolved.sdk,
                runtime: Some(resolved.runtime),
            },
        }
    }
}

pub struct ReleaseReconciler {
    changelogs: Arc<dyn ChangelogFetcher>,
    inspector: Arc<dyn VersionInspector>,
    options: ReconcilerOptions,
}

impl ReleaseReconciler {
    pub fn new(changelogs: Arc<dyn ChangelogFetcher>, inspector: Arc<dyn VersionInspector>) -> Self {
        Self {
            changelogs,
            inspector,
            options: ReconcilerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReconcilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Reconcile the publishing history of `channel`.
    ///
    /// Fails only when some records were available but none of them could be
    /// turned into a release.
    pub async fn reconcile(
        &self,
        channel: &str,
        records: &[RawPublicationRecord],
    ) -> Result<Reconciliation, ReconcileError> {
        let mut diagnostics = Vec::new();
        let mut available = 0usize;
        let mut candidates = Vec::new();

        for record in records {
            let version = &record.source_package_version;

            let Some(published_at) = record.date_published else {
                debug!("Skipping {}: not published", version);
                diagnostics.push(Diagnostic::Unpublished {
                    version: version.clone(),
                });
                continue;
            };

            if record.pocket == ArchivePocket::Proposed {
                debug!("Skipping {}: still in proposed", version);
                diagnostics.push(Diagnostic::Proposed {
                    version: version.clone(),
                });
                continue;
            }

            available += 1;

            let versions = match PackageVersionIdentity::decompose(version) {
                Ok(identity) => Versions::Decomposed(identity),
                Err(e) => {
                    debug!("{}: {}, inspecting", version, e);
                    match self.inspector.resolve_versions(version).await {
                        Ok(resolved) => Versions::Inspected(resolved),
                        Err(inspection) => {
                            warn!("Skipping {}: {} ({})", version, e, inspection);
                            diagnostics.push(Diagnostic::MalformedVersion {
                                version: version.clone(),
                                reason: format!("{} ({})", e, inspection),
                            });
                            continue;
                        }
                    }
                }
            };

            candidates.push(Candidate {
                record,
                package_version: DebianVersion::new(version.as_str()),
                published_at,
                versions,
            });
        }

        info!(
            "Reconciling {} of {} publications for channel {}",
            candidates.len(),
            records.len(),
            channel
        );

        candidates.sort_by(|a, b| b.package_version.cmp(&a.package_version));

        let mut groups: IndexMap<LogicalIdentity, Vec<Candidate>> = IndexMap::new();
        for candidate in candidates {
            groups
                .entry(candidate.logical_identity())
                .or_default()
                .push(candidate);
        }

        let mut releases = Vec::with_capacity(groups.len());
        for group in groups.into_values() {
            let Some(representative) = select_representative(group) else {
                continue;
            };

            if let Some(release) = self.classify(representative, &mut diagnostics).await {
                releases.push(release);
            }
        }

        if releases.is_empty() && available > 0 {
            warn!("No release of channel {} could be resolved", channel);
            return Err(ReconcileError::NoResolvableReleases {
                channel: channel.to_string(),
            });
        }

        info!(
            "Channel {}: {} releases, {} diagnostics",
            channel,
            releases.len(),
            diagnostics.len()
        );

        Ok(Reconciliation {
            releases,
            diagnostics,
        })
    }

    async fn classify(
        &self,
        candidate: Candidate<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<ReconciledRelease> {
        let Candidate {
            record,
            published_at,
            versions,
            ..
        } = candidate;
        let version = &record.source_package_version;

        debug!(
            "Representative {} from {} pocket",
            version, record.pocket
        );

        let (sdk, runtime, aspnetcore_runtime) = match versions {
            Versions::Inspected(resolved) => (
                resolved.sdk,
                Some(resolved.runtime),
                resolved.aspnetcore_runtime,
            ),
            Versions::Decomposed(identity) if !identity.needs_inspection() => {
                (identity.sdk(), identity.runtime(), identity.runtime())
            }
            Versions::Decomposed(_) => {
                debug!("{} does not encode its runtime, inspecting", version);
                match self.inspector.resolve_versions(version).await {
                    Ok(resolved) => (
                        resolved.sdk,
                        Some(resolved.runtime),
                        resolved.aspnetcore_runtime,
                    ),
                    Err(e) => {
                        warn!("Skipping {}: {}", version, e);
                        diagnostics.push(Diagnostic::UnresolvedVersions {
                            version: version.clone(),
                            reason: e.to_string(),
                        });
                        return None;
                    }
                }
            }
        };

        let mut security = record.pocket == ArchivePocket::Security;
        let cves = if self.options.scan_changelogs {
            self.scan_changelog(record, diagnostics).await
        } else {
            Vec::new()
        };

        if !cves.is_empty() {
            if !security {
                info!(
                    "{} published to {} but fixes {} CVEs, marking as security release",
                    version,
                    record.pocket,
                    cves.len()
                );
            }
            security = true;
        }

        Some(ReconciledRelease {
            version: runtime.unwrap_or(sdk),
            sdk,
            runtime,
            aspnetcore_runtime,
            release_date: published_at.date_naive(),
            security,
            cves,
            provenance: record.clone(),
        })
    }

    async fn scan_changelog(
        &self,
        record: &RawPublicationRecord,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Cve> {
        let version = &record.source_package_version;

        let text = match self.changelogs.fetch_changelog(record).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to fetch changelog of {}: {}", version, e);
                diagnostics.push(Diagnostic::ChangelogUnavailable {
                    version: version.clone(),
                    reason: e.to_string(),
                });
                return Vec::new();
            }
        };

        match parse_latest_entry(&text) {
            Some(entry) => extract_cves(&entry.description),
            None => {
                warn!("Changelog of {} has no readable entry", version);
                diagnostics.push(Diagnostic::ChangelogUnreadable {
                    version: version.clone(),
                });
                Vec::new()
            }
        }
    }
}

/// Order by publication time, newest first, and take the earliest security
/// publication, or the earliest publication when none went to security.
fn select_representative(mut group: Vec<Candidate<'_>>) -> Option<Candidate<'_>> {
    group.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| b.package_version.cmp(&a.package_version))
    });

    match group
        .iter()
        .rposition(|candidate| candidate.record.pocket == ArchivePocket::Security)
    {
        Some(index) => Some(group.swap_remove(index)),
        None => group.pop(),
    }
}
