//! Archive test utilities

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use dotnet_archive_releases::archive::{
    ArchivePocket, ChangelogFetcher, FetchError, PublishingStatus, RawPublicationRecord,
    ResolutionError, ResolvedVersions, VersionInspector,
};
use dotnet_archive_releases::release::ReleaseReconciler;

/// Changelog fetcher serving canned changelogs by source package version
#[derive(Default)]
pub struct FakeChangelogFetcher {
    changelogs: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeChangelogFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_changelog(mut self, version: &str, text: &str) -> Self {
        self.changelogs.insert(version.to_string(), text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChangelogFetcher for FakeChangelogFetcher {
    async fn fetch_changelog(&self, record: &RawPublicationRecord) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.changelogs
            .get(&record.source_package_version)
            .cloned()
            .ok_or_else(|| {
                FetchError::InvalidResponse(format!(
                    "no changelog for {}",
                    record.source_package_version
                ))
            })
    }
}

/// Inspector serving canned versions by source package version
#[derive(Default)]
pub struct FakeInspector {
    versions: HashMap<String, ResolvedVersions>,
    calls: AtomicUsize,
}

impl FakeInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn with_versions(mut self, raw: &str, runtime: &str, sdk: &str) -> Self {
        let runtime = runtime.parse().unwrap();
        self.versions.insert(
            raw.to_string(),
            ResolvedVersions {
                runtime,
                aspnetcore_runtime: Some(runtime),
                sdk: sdk.parse().unwrap(),
            },
        );
        self
    }
}

#[async_trait]
impl VersionInspector for FakeInspector {
    async fn resolve_versions(
        &self,
        source_package_version: &str,
    ) -> Result<ResolvedVersions, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.versions
            .get(source_package_version)
            .copied()
            .ok_or_else(|| ResolutionError::Unavailable(source_package_version.to_string()))
    }
}

pub fn create_test_reconciler(
    changelogs: Arc<FakeChangelogFetcher>,
    inspector: Arc<FakeInspector>,
) -> ReleaseReconciler {
    ReleaseReconciler::new(changelogs, inspector)
}

/// Publication timestamp on the given day of November 2023
pub fn published(day: u32) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2023, 11, day, 18, 0, 0).unwrap())
}

pub fn record(
    name: &str,
    version: &str,
    pocket: ArchivePocket,
    date_published: Option<DateTime<Utc>>,
) -> RawPublicationRecord {
    RawPublicationRecord {
        source_package_name: name.to_string(),
        source_package_version: version.to_string(),
        pocket,
        status: PublishingStatus::Published,
        date_published,
        self_link: format!(
            "https://api.launchpad.net/devel/ubuntu/+archive/primary/+sourcepub/{}",
            version
        ),
    }
}

/// Debian changelog whose latest entry mentions `cves`
pub fn changelog(name: &str, version: &str, cves: &[&str]) -> String {
    let mut body = String::from("  * New upstream release\n");
    for cve in cves {
        body.push_str(&format!("    - {}\n", cve));
    }

    format!(
        "{name} ({version}) noble; urgency=medium\n\n{body}\n -- Jane Doe <jane@example.com>  Tue, 14 Nov 2023 12:00:00 +0000\n\n\
{name} (8.0.100-8.0.0~rc1-0ubuntu1) noble; urgency=medium\n\n  * Older entry mentioning CVE-2020-0001\n\n -- Jane Doe <jane@example.com>  Tue, 10 Oct 2023 12:00:00 +0000\n"
    )
}
