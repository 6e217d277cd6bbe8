//! Release metadata files
//!
//! Serde model of the .NET release metadata format: `releases-index.json`
//! lists the channels, and each channel has its own `releases.json`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::release::cve::Cve;
use crate::release::reconciler::ReconciledRelease;
use crate::release::summary::ChannelSummary;
use crate::version::product::ProductVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseSupportPhase {
    Preview,
    GoLive,
    Active,
    Maintenance,
    Eol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Lts,
    Sts,
}

/// `releases-index.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(rename = "releases-index")]
    pub releases_index: Vec<Channel>,
}

/// Channel entry of the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Channel {
    pub channel_version: String,
    pub latest_release: ProductVersion,
    pub latest_release_date: NaiveDate,
    pub security: bool,
    pub latest_runtime: ProductVersion,
    pub latest_sdk: ProductVersion,
    pub product: String,
    pub support_phase: ReleaseSupportPhase,
    pub eol_date: Option<NaiveDate>,
    pub release_type: ReleaseType,
    #[serde(rename = "releases.json")]
    pub releases_json: String,
    #[serde(rename = "supported-os.json", skip_serializing_if = "Option::is_none", default)]
    pub supported_os_json: Option<String>,
}

impl Channel {
    pub fn new(
        summary: &ChannelSummary,
        releases_json: String,
        supported_os_json: Option<String>,
    ) -> Self {
        Self {
            channel_version: summary.channel_version.clone(),
            latest_release: summary.latest_release,
            latest_release_date: summary.latest_release_date,
            security: summary.security,
            latest_runtime: summary.latest_runtime,
            latest_sdk: summary.latest_sdk,
            product: summary.product.clone(),
            support_phase: summary.support_phase,
            eol_date: summary.eol_date,
            release_type: summary.release_type,
            releases_json,
            supported_os_json,
        }
    }
}

/// Per-channel `releases.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelDetails {
    pub channel_version: String,
    pub latest_release: ProductVersion,
    pub latest_release_date: NaiveDate,
    pub latest_runtime: ProductVersion,
    pub latest_sdk: ProductVersion,
    pub support_phase: ReleaseSupportPhase,
    pub release_type: ReleaseType,
    pub eol_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lifecycle_policy: Option<String>,
    pub releases: Vec<Release>,
}

impl ChannelDetails {
    /// Builds the channel history, newest release first
    pub fn new(
        summary: &ChannelSummary,
        releases: &[ReconciledRelease],
        lifecycle_policy: Option<String>,
    ) -> Self {
        let mut releases: Vec<Release> = releases.iter().map(Release::from).collect();
        releases.sort_by(|a, b| {
            b.release_date
                .cmp(&a.release_date)
                .then_with(|| b.release_version.cmp(&a.release_version))
        });

        Self {
            channel_version: summary.channel_version.clone(),
            latest_release: summary.latest_release,
            latest_release_date: summary.latest_release_date,
            latest_runtime: summary.latest_runtime,
            latest_sdk: summary.latest_sdk,
            support_phase: summary.support_phase,
            release_type: summary.release_type,
            eol_date: summary.eol_date,
            lifecycle_policy,
            releases,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Release {
    pub release_date: NaiveDate,
    pub release_version: ProductVersion,
    pub security: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub cve_list: Vec<Cve>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub release_notes: Option<String>,
    pub runtime: Runtime,
    pub sdk: Sdk,
    pub sdks: Vec<Sdk>,
    pub aspnetcore_runtime: AspNetCoreRuntime,
}

impl From<&ReconciledRelease> for Release {
    fn from(release: &ReconciledRelease) -> Self {
        let runtime = release.runtime.unwrap_or(release.version);
        let aspnetcore_runtime = release.aspnetcore_runtime.unwrap_or(runtime);
        let sdk = Sdk::new(release.sdk, runtime);

        Self {
            release_date: release.release_date,
            release_version: release.version,
            security: release.security,
            cve_list: release.cves.clone(),
            release_notes: None,
            runtime: Runtime::new(runtime),
            sdk: sdk.clone(),
            sdks: vec![sdk],
            aspnetcore_runtime: AspNetCoreRuntime::new(aspnetcore_runtime),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Runtime {
    pub version: ProductVersion,
    pub version_display: String,
}

impl Runtime {
    pub fn new(version: ProductVersion) -> Self {
        Self {
            version,
            version_display: version.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Sdk {
    pub version: ProductVersion,
    pub version_display: String,
    pub runtime_version: ProductVersion,
}

impl Sdk {
    pub fn new(version: ProductVersion, runtime_version: ProductVersion) -> Self {
        Self {
            version,
            version_display: version.to_string(),
            runtime_version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AspNetCoreRuntime {
    pub version: ProductVersion,
    pub version_display: String,
}

impl AspNetCoreRuntime {
    pub fn new(version: ProductVersion) -> Self {
        Self {
            version,
            version_display: version.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::types::{ArchivePocket, PublishingStatus, RawPublicationRecord};
    use serde_json::json;

    fn v(text: &str) -> ProductVersion {
        text.parse().unwrap()
    }

    fn reconciled(runtime: &str, sdk: &str, day: u32, cves: Vec<Cve>) -> ReconciledRelease {
        ReconciledRelease {
            version: v(runtime),
            sdk: v(sdk),
            runtime: Some(v(runtime)),
            aspnetcore_runtime: Some(v(runtime)),
            release_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            security: !cves.is_empty(),
            cves,
            provenance: RawPublicationRecord {
                source_package_name: "dotnet8".to_string(),
                source_package_version: format!("{}-{}-0ubuntu1", sdk, runtime),
                pocket: ArchivePocket::Updates,
                status: PublishingStatus::Published,
                date_published: None,
                self_link: "https://api.launchpad.net/devel/ubuntu/+archive/primary/+sourcepub/1"
                    .to_string(),
            },
        }
    }

    #[test]
    fn release_serializes_with_kebab_case_fields() {
        let release = Release::from(&reconciled(
            "8.0.1",
            "8.0.101",
            9,
            vec![Cve::new("CVE-2024-0056")],
        ));

        assert_eq!(
            serde_json::to_value(&release).unwrap(),
            json!({
                "release-date": "2024-01-09",
                "release-version": "8.0.1",
                "security": true,
                "cve-list": [
                    {
                        "cve-id": "CVE-2024-0056",
                        "cve-url": "https://ubuntu.com/security/CVE-2024-0056"
                    }
                ],
                "runtime": { "version": "8.0.1", "version-display": "8.0.1" },
                "sdk": {
                    "version": "8.0.101",
                    "version-display": "8.0.101",
                    "runtime-version": "8.0.1"
                },
                "sdks": [{
                    "version": "8.0.101",
                    "version-display": "8.0.101",
                    "runtime-version": "8.0.1"
                }],
                "aspnetcore-runtime": { "version": "8.0.1", "version-display": "8.0.1" }
            })
        );
    }

    #[test]
    fn release_omits_empty_cve_list() {
        let release = Release::from(&reconciled("8.0.0", "8.0.100", 2, vec![]));
        let value = serde_json::to_value(&release).unwrap();

        assert!(value.get("cve-list").is_none());
        assert_eq!(value["security"], json!(false));
    }

    #[test]
    fn release_falls_back_to_runtime_for_missing_grains() {
        let mut release = reconciled("6.0.0", "6.0.100", 2, vec![]);
        release.aspnetcore_runtime = None;

        let release = Release::from(&release);

        assert_eq!(release.aspnetcore_runtime.version, v("6.0.0"));
        assert_eq!(release.sdk.runtime_version, v("6.0.0"));
    }

    #[test]
    fn support_phase_and_release_type_use_lowercase_names() {
        assert_eq!(
            serde_json::to_value(ReleaseSupportPhase::GoLive).unwrap(),
            json!("go-live")
        );
        assert_eq!(
            serde_json::to_value(ReleaseSupportPhase::Eol).unwrap(),
            json!("eol")
        );
        assert_eq!(serde_json::to_value(ReleaseType::Lts).unwrap(), json!("lts"));
        assert_eq!(
            serde_json::from_value::<ReleaseType>(json!("sts")).unwrap(),
            ReleaseType::Sts
        );
    }
}
