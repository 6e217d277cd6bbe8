//! .NET product versions
//!
//! A product version is the upstream three-part version of a runtime or SDK,
//! optionally qualified as a preview or release candidate:
//! - Stable: `8.0.0`, `8.0.100`
//! - Preview: `9.0.0-preview.7` (legacy shorthand `9.0.0-preview7`)
//! - Release candidate: `8.0.0-rc.2` (legacy shorthand `8.0.0-rc2`)

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::version::error::VersionError;

/// Kind of pre-release qualifier
///
/// Declaration order is significant: previews sort before release candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrereleaseKind {
    Preview,
    ReleaseCandidate,
}

impl PrereleaseKind {
    /// Returns the qualifier literal used in version strings
    pub fn as_str(&self) -> &'static str {
        match self {
            PrereleaseKind::Preview => "preview",
            PrereleaseKind::ReleaseCandidate => "rc",
        }
    }
}

/// Pre-release qualifier with its (positive) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prerelease {
    kind: PrereleaseKind,
    identifier: u32,
}

impl Prerelease {
    pub fn new(kind: PrereleaseKind, identifier: u32) -> Result<Self, VersionError> {
        if identifier == 0 {
            return Err(VersionError::MalformedVersion(format!(
                "{}.{}",
                kind.as_str(),
                identifier
            )));
        }
        Ok(Self { kind, identifier })
    }

    pub fn kind(&self) -> PrereleaseKind {
        self.kind
    }

    pub fn identifier(&self) -> u32 {
        self.identifier
    }
}

/// Upstream .NET version (runtime or SDK grain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    prerelease: Option<Prerelease>,
}

impl ProductVersion {
    /// Creates a stable version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Creates a pre-release version. Fails if `identifier` is zero.
    pub fn prerelease(
        major: u32,
        minor: u32,
        patch: u32,
        kind: PrereleaseKind,
        identifier: u32,
    ) -> Result<Self, VersionError> {
        Ok(Self::new(major, minor, patch).with_prerelease(Some(Prerelease::new(kind, identifier)?)))
    }

    /// Returns a copy of this version carrying the given qualifier
    pub fn with_prerelease(self, prerelease: Option<Prerelease>) -> Self {
        Self { prerelease, ..self }
    }

    /// Returns the `major.minor.patch` part without any qualifier
    pub fn without_prerelease(self) -> Self {
        self.with_prerelease(None)
    }

    pub fn pre_release(&self) -> Option<Prerelease> {
        self.prerelease
    }

    pub fn is_stable(&self) -> bool {
        self.prerelease.is_none()
    }

    /// Runtime versions keep their patch below 100 (`8.0.11`)
    pub fn is_runtime(&self) -> bool {
        self.patch < 100
    }

    /// SDK versions encode the feature band in the patch hundreds (`8.0.404`)
    pub fn is_sdk(&self) -> bool {
        !self.is_runtime()
    }

    /// SDK feature band, e.g. `8.0.404` -> `400`. `None` for runtime versions.
    pub fn feature_band(&self) -> Option<u32> {
        self.is_sdk().then(|| self.patch / 100 * 100)
    }
}

impl Ord for ProductVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.prerelease, other.prerelease) {
                (None, None) => Ordering::Equal,
                // A stable release is newer than any of its pre-releases
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a
                    .kind
                    .cmp(&b.kind)
                    .then(a.identifier.cmp(&b.identifier)),
            })
    }
}

impl PartialOrd for ProductVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for ProductVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || VersionError::MalformedVersion(s.to_string());

        let (core, qualifier) = match s.split_once('-') {
            Some((core, qualifier)) => (core, Some(qualifier)),
            None => (s, None),
        };

        let fields: Vec<u32> = core
            .split('.')
            .map(parse_number)
            .collect::<Option<_>>()
            .ok_or_else(malformed)?;

        let &[major, minor, patch] = fields.as_slice() else {
            return Err(malformed());
        };

        let prerelease = qualifier
            .map(|q| parse_qualifier(q).ok_or_else(malformed))
            .transpose()?;

        Ok(Self {
            major,
            minor,
            patch,
            prerelease,
        })
    }
}

/// Parse a non-empty run of ASCII digits
pub(crate) fn parse_number(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Parse `preview.N`, `rc.N`, `previewN` or `rcN`
fn parse_qualifier(qualifier: &str) -> Option<Prerelease> {
    let (kind, rest) = if let Some(rest) = qualifier.strip_prefix("preview") {
        (PrereleaseKind::Preview, rest)
    } else if let Some(rest) = qualifier.strip_prefix("rc") {
        (PrereleaseKind::ReleaseCandidate, rest)
    } else {
        return None;
    };

    let digits = rest.strip_prefix('.').unwrap_or(rest);
    let identifier = parse_number(digits)?;
    Prerelease::new(kind, identifier).ok()
}

impl fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(prerelease) = self.prerelease {
            write!(
                f,
                "-{}.{}",
                prerelease.kind.as_str(),
                prerelease.identifier
            )?;
        }
        Ok(())
    }
}

impl Serialize for ProductVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProductVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
