//! Ubuntu source package versions of .NET
//!
//! The archive embeds the upstream product versions in the source package
//! version. Two layouts exist:
//! - SDK and runtime grain: `8.0.100-8.0.0-0ubuntu2`, `9.0.104-9.0.3~preview1-0ubuntu2~24.04.1`
//! - SDK grain only (older series): `6.0.100-0ubuntu1~22.04.1`, `7.0.105~rc1-0ubuntu1`
//!
//! The pre-release qualifier (`~previewN` / `~rcN`) applies to both grains.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::version::error::VersionError;
use crate::version::product::{Prerelease, PrereleaseKind, ProductVersion, parse_number};

static SOURCE_PACKAGE_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?<sdk>\d+\.\d+\.\d+)(?:-(?<runtime>\d+\.\d+\.\d+))?(?:~(?<kind>preview|rc)(?<id>\d+))?-(?<revision>\d+ubuntu\d+)(?:~(?<revision_pre>[A-Za-z0-9_.]+))?$",
    )
    .expect("source package version pattern is valid")
});

/// Runtime grain of a source package version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeGrain {
    /// The runtime version is part of the package version
    Embedded(ProductVersion),
    /// Only the SDK version is encoded; the runtime must be derived elsewhere
    SdkOnly,
}

/// (SDK, runtime) pair identifying "the same release" across re-publications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogicalIdentity {
    pub sdk: ProductVersion,
    pub runtime: Option<ProductVersion>,
}

/// Decomposed source package version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersionIdentity {
    raw: String,
    sdk: ProductVersion,
    runtime: RuntimeGrain,
    revision: String,
    revision_prerelease: Option<String>,
}

impl PackageVersionIdentity {
    /// Decompose a raw source package version
    pub fn decompose(raw: &str) -> Result<Self, VersionError> {
        let malformed = || VersionError::MalformedPackageVersion(raw.to_string());

        let caps = SOURCE_PACKAGE_VERSION_RE
            .captures(raw)
            .ok_or_else(malformed)?;

        let prerelease = match (caps.name("kind"), caps.name("id")) {
            (Some(kind), Some(id)) => {
                let kind = match kind.as_str() {
                    "preview" => PrereleaseKind::Preview,
                    _ => PrereleaseKind::ReleaseCandidate,
                };
                let identifier = parse_number(id.as_str()).ok_or_else(malformed)?;
                Some(Prerelease::new(kind, identifier).map_err(|_| malformed())?)
            }
            _ => None,
        };

        let grain = |text: &str| -> Result<ProductVersion, VersionError> {
            let version: ProductVersion = text.parse().map_err(|_| malformed())?;
            Ok(version.with_prerelease(prerelease))
        };

        let sdk = grain(&caps["sdk"])?;
        let runtime = match caps.name("runtime") {
            Some(runtime) => RuntimeGrain::Embedded(grain(runtime.as_str())?),
            None => RuntimeGrain::SdkOnly,
        };

        Ok(Self {
            raw: raw.to_string(),
            sdk,
            runtime,
            revision: caps["revision"].to_string(),
            revision_prerelease: caps.name("revision_pre").map(|m| m.as_str().to_string()),
        })
    }

    /// The raw source package version this identity was decomposed from
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn sdk(&self) -> ProductVersion {
        self.sdk
    }

    pub fn runtime_grain(&self) -> RuntimeGrain {
        self.runtime
    }

    pub fn runtime(&self) -> Option<ProductVersion> {
        match self.runtime {
            RuntimeGrain::Embedded(runtime) => Some(runtime),
            RuntimeGrain::SdkOnly => None,
        }
    }

    /// Packaging revision, e.g. `0ubuntu2`
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Series qualifier of the revision, e.g. `22.04.1`
    pub fn revision_prerelease(&self) -> Option<&str> {
        self.revision_prerelease.as_deref()
    }

    pub fn logical_identity(&self) -> LogicalIdentity {
        LogicalIdentity {
            sdk: self.sdk,
            runtime: self.runtime(),
        }
    }

    /// Runtime grain when present, SDK grain otherwise
    pub fn canonical_version(&self) -> ProductVersion {
        self.runtime().unwrap_or(self.sdk)
    }

    pub fn is_stable(&self) -> bool {
        self.sdk.is_stable()
    }

    /// Pre-release uploads that only encode the SDK grain do not tell which
    /// runtime they ship; their product versions come from the artifacts.
    pub fn needs_inspection(&self) -> bool {
        self.runtime().is_none() && !self.is_stable()
    }

    /// Version under which the archive publishes the runtime binary packages.
    ///
    /// `None` when the runtime grain is not encoded.
    pub fn reconstruct_runtime_package_version(&self) -> Option<String> {
        self.runtime().map(|runtime| self.archive_form(runtime))
    }

    /// Version under which the archive publishes the SDK binary packages
    pub fn reconstruct_sdk_package_version(&self) -> String {
        self.archive_form(self.sdk)
    }

    fn archive_form(&self, version: ProductVersion) -> String {
        let mut out = match version.pre_release() {
            None => version.to_string(),
            Some(prerelease) => format!(
                "{}~{}{}",
                version.without_prerelease(),
                prerelease.kind().as_str(),
                prerelease.identifier()
            ),
        };

        out.push('-');
        out.push_str(&self.revision);
        if let Some(revision_prerelease) = &self.revision_prerelease {
            out.push('~');
            out.push_str(revision_prerelease);
        }
        out
    }
}

impl FromStr for PackageVersionIdentity {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decompose(s)
    }
}

impl fmt::Display for PackageVersionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(text: &str) -> ProductVersion {
        text.parse().unwrap()
    }

    #[rstest]
    #[case("8.0.100-8.0.0-0ubuntu2", "8.0.100", Some("8.0.0"), "0ubuntu2", None)]
    #[case("9.0.104-9.0.3-0ubuntu2", "9.0.104", Some("9.0.3"), "0ubuntu2", None)]
    #[case(
        "8.0.100-8.0.0-0ubuntu2~22.04.1",
        "8.0.100",
        Some("8.0.0"),
        "0ubuntu2",
        Some("22.04.1")
    )]
    #[case(
        "8.0.100-8.0.0~rc2-0ubuntu2",
        "8.0.100-rc.2",
        Some("8.0.0-rc.2"),
        "0ubuntu2",
        None
    )]
    #[case(
        "9.0.104-9.0.3~preview1-0ubuntu2~23.04.1",
        "9.0.104-preview.1",
        Some("9.0.3-preview.1"),
        "0ubuntu2",
        Some("23.04.1")
    )]
    // SDK grain only
    #[case("6.0.100-0ubuntu1~22.04.1", "6.0.100", None, "0ubuntu1", Some("22.04.1"))]
    #[case("7.0.105~rc1-0ubuntu1", "7.0.105-rc.1", None, "0ubuntu1", None)]
    fn decompose_accepts_both_layouts(
        #[case] raw: &str,
        #[case] sdk: &str,
        #[case] runtime: Option<&str>,
        #[case] revision: &str,
        #[case] revision_prerelease: Option<&str>,
    ) {
        let identity = PackageVersionIdentity::decompose(raw).unwrap();

        assert_eq!(identity.raw(), raw);
        assert_eq!(identity.sdk(), v(sdk));
        assert_eq!(identity.runtime(), runtime.map(v));
        assert_eq!(identity.revision(), revision);
        assert_eq!(identity.revision_prerelease(), revision_prerelease);
    }

    #[rstest]
    #[case("")]
    #[case("8.0.100")]
    #[case("8.0.100-8.0.0")]
    #[case("8.0.100-blah-blah-8.0.0~rc2-0ubuntu2")]
    #[case("9.0.104-403-9.0.3~preview1-0ubuntu2+123")]
    #[case("8.0.100-8.0.0~beta1-0ubuntu2")]
    #[case("8.0.100-8.0.0~rc0-0ubuntu2")]
    #[case("8.0.100-8.0.0-0debian2")]
    #[case("8.0-8.0.0-0ubuntu2")]
    fn decompose_rejects_other_layouts(#[case] raw: &str) {
        assert_eq!(
            PackageVersionIdentity::decompose(raw),
            Err(VersionError::MalformedPackageVersion(raw.to_string()))
        );
    }

    #[test]
    fn runtime_grain_is_tagged() {
        let embedded = PackageVersionIdentity::decompose("8.0.100-8.0.0-0ubuntu2").unwrap();
        let sdk_only = PackageVersionIdentity::decompose("6.0.100-0ubuntu1").unwrap();

        assert_eq!(embedded.runtime_grain(), RuntimeGrain::Embedded(v("8.0.0")));
        assert_eq!(sdk_only.runtime_grain(), RuntimeGrain::SdkOnly);
        assert_eq!(embedded.canonical_version(), v("8.0.0"));
        assert_eq!(sdk_only.canonical_version(), v("6.0.100"));
    }

    #[rstest]
    #[case("8.0.100-8.0.0-0ubuntu2", false)]
    #[case("8.0.100-8.0.0~rc2-0ubuntu2", false)]
    #[case("9.0.104-9.0.3~preview1-0ubuntu2~23.04.1", false)]
    #[case("6.0.100-0ubuntu1", false)]
    #[case("7.0.105~rc1-0ubuntu1", true)]
    #[case("8.0.100~preview7-0ubuntu1", true)]
    fn only_sdk_grain_prereleases_need_inspection(#[case] raw: &str, #[case] expected: bool) {
        let identity = PackageVersionIdentity::decompose(raw).unwrap();
        assert_eq!(identity.needs_inspection(), expected);
    }

    #[test]
    fn republications_share_a_logical_identity() {
        let first = PackageVersionIdentity::decompose("8.0.100-8.0.1-0ubuntu1~22.04.1").unwrap();
        let second = PackageVersionIdentity::decompose("8.0.100-8.0.1-0ubuntu1~22.04.2").unwrap();

        assert_ne!(first, second);
        assert_eq!(first.logical_identity(), second.logical_identity());
    }

    #[rstest]
    #[case("8.0.100-8.0.0-0ubuntu2", Some("8.0.0-0ubuntu2"))]
    #[case("9.0.104-9.0.3~preview1-0ubuntu2", Some("9.0.3~preview1-0ubuntu2"))]
    #[case(
        "9.0.104-9.0.3~preview1-0ubuntu2~23.04.1",
        Some("9.0.3~preview1-0ubuntu2~23.04.1")
    )]
    #[case("6.0.100-0ubuntu1~22.04.1", None)]
    fn reconstruct_runtime_package_version(#[case] raw: &str, #[case] expected: Option<&str>) {
        let identity = PackageVersionIdentity::decompose(raw).unwrap();
        assert_eq!(
            identity.reconstruct_runtime_package_version().as_deref(),
            expected
        );
    }

    #[rstest]
    #[case("8.0.100-8.0.0-0ubuntu2", "8.0.100-0ubuntu2")]
    #[case("9.0.104-9.0.3~preview1-0ubuntu2", "9.0.104~preview1-0ubuntu2")]
    #[case(
        "9.0.104-9.0.3~preview1-0ubuntu2~23.04.1",
        "9.0.104~preview1-0ubuntu2~23.04.1"
    )]
    #[case("7.0.105~rc1-0ubuntu1", "7.0.105~rc1-0ubuntu1")]
    fn reconstruct_sdk_package_version(#[case] raw: &str, #[case] expected: &str) {
        let identity = PackageVersionIdentity::decompose(raw).unwrap();
        assert_eq!(identity.reconstruct_sdk_package_version(), expected);
    }

    #[rstest]
    #[case("8.0.100-8.0.0-0ubuntu2")]
    #[case("8.0.100-8.0.0~rc2-0ubuntu2~22.04.1")]
    #[case("9.0.104-9.0.3~preview1-0ubuntu2")]
    #[case("7.0.105~rc1-0ubuntu1")]
    fn reconstructed_versions_decompose_to_the_same_grains(#[case] raw: &str) {
        let identity = PackageVersionIdentity::decompose(raw).unwrap();

        let sdk = PackageVersionIdentity::decompose(&identity.reconstruct_sdk_package_version())
            .unwrap();
        assert_eq!(sdk.sdk(), identity.sdk());
        assert_eq!(sdk.revision(), identity.revision());
        assert_eq!(sdk.revision_prerelease(), identity.revision_prerelease());

        if let Some(runtime_raw) = identity.reconstruct_runtime_package_version() {
            let runtime = PackageVersionIdentity::decompose(&runtime_raw).unwrap();
            assert_eq!(Some(runtime.sdk()), identity.runtime());
            assert_eq!(runtime.revision(), identity.revision());
        }
    }
}
