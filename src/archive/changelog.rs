//! Debian changelog access
//!
//! Reconciliation only looks at the most recent changelog entry, which
//! describes the upload that produced the publication:
//!
//! ```text
//! dotnet8 (8.0.100-8.0.0-0ubuntu2~22.04.1) jammy-security; urgency=medium
//!
//!   * SECURITY UPDATE: Denial of service
//!     - CVE-2023-36558
//!
//!  -- Jane Doe <jane@example.com>  Tue, 14 Nov 2023 12:00:00 +0000
//! ```

use std::sync::LazyLock;

#[cfg(test)]
use mockall::automock;
use regex::Regex;

use crate::archive::error::FetchError;
use crate::archive::types::RawPublicationRecord;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<package>\S+) \((?<version>[^)]+)\) (?<distributions>[^;]*);(?<metadata>.*)$")
        .expect("changelog header pattern is valid")
});

/// Trait for fetching the changelog text of a publication
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ChangelogFetcher: Send + Sync {
    /// Fetches the full Debian changelog published with `record`
    async fn fetch_changelog(&self, record: &RawPublicationRecord) -> Result<String, FetchError>;
}

/// One entry of a Debian changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub package: String,
    pub version: String,
    pub distributions: Vec<String>,
    pub urgency: Option<String>,
    /// Body lines with the two-space indentation removed
    pub description: String,
    pub maintainer: Option<String>,
    pub date: Option<String>,
}

/// Parse the most recent entry of a Debian changelog.
///
/// Returns `None` when the first non-blank line is not an entry header.
pub fn parse_latest_entry(text: &str) -> Option<ChangelogEntry> {
    let mut lines = text.lines().skip_while(|line| line.trim().is_empty());

    let caps = HEADER_RE.captures(lines.next()?.trim_end())?;

    let urgency = caps["metadata"].split(',').find_map(|field| {
        let (key, value) = field.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("urgency")
            .then(|| value.trim().to_string())
    });

    let mut body = Vec::new();
    let mut maintainer = None;
    let mut date = None;

    for line in lines {
        if let Some(trailer) = line.strip_prefix(" -- ") {
            let (who, when) = match trailer.split_once("  ") {
                Some((who, when)) => (who, Some(when)),
                None => (trailer, None),
            };
            maintainer = Some(who.trim().to_string());
            date = when.map(|when| when.trim().to_string());
            break;
        }
        // Next header without a trailer: the entry is truncated
        if !line.is_empty() && !line.starts_with(char::is_whitespace) {
            break;
        }
        body.push(line.strip_prefix("  ").unwrap_or(line.trim_start()));
    }

    while body.first().is_some_and(|line| line.trim().is_empty()) {
        body.remove(0);
    }
    while body.last().is_some_and(|line| line.trim().is_empty()) {
        body.pop();
    }

    Some(ChangelogEntry {
        package: caps["package"].to_string(),
        version: caps["version"].to_string(),
        distributions: caps["distributions"]
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        urgency,
        description: body.join("\n"),
        maintainer,
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGELOG: &str = "\
dotnet8 (8.0.100-8.0.0-0ubuntu2~22.04.1) jammy-security; urgency=medium

  * SECURITY UPDATE: Denial of service
    - CVE-2023-36558
    - CVE-2023-36049

 -- Jane Doe <jane@example.com>  Tue, 14 Nov 2023 12:00:00 +0000

dotnet8 (8.0.100-8.0.0~rc2-0ubuntu1) noble; urgency=low

  * New upstream release candidate
  * Fixes CVE-2023-00001

 -- Jane Doe <jane@example.com>  Tue, 10 Oct 2023 12:00:00 +0000
";

    #[test]
    fn parse_latest_entry_reads_only_the_first_entry() {
        let entry = parse_latest_entry(CHANGELOG).unwrap();

        assert_eq!(entry.package, "dotnet8");
        assert_eq!(entry.version, "8.0.100-8.0.0-0ubuntu2~22.04.1");
        assert_eq!(entry.distributions, vec!["jammy-security".to_string()]);
        assert_eq!(entry.urgency.as_deref(), Some("medium"));
        assert_eq!(
            entry.description,
            "* SECURITY UPDATE: Denial of service\n  - CVE-2023-36558\n  - CVE-2023-36049"
        );
        assert_eq!(
            entry.maintainer.as_deref(),
            Some("Jane Doe <jane@example.com>")
        );
        assert_eq!(entry.date.as_deref(), Some("Tue, 14 Nov 2023 12:00:00 +0000"));
    }

    #[test]
    fn parse_latest_entry_skips_leading_blank_lines() {
        let entry = parse_latest_entry(&format!("\n\n{CHANGELOG}")).unwrap();
        assert_eq!(entry.version, "8.0.100-8.0.0-0ubuntu2~22.04.1");
    }

    #[test]
    fn parse_latest_entry_stops_at_next_header_without_trailer() {
        let text = "\
dotnet6 (6.0.100-0ubuntu1) jammy; urgency=medium

  * Initial release

dotnet6 (6.0.100~rc2-0ubuntu1) jammy; urgency=medium

  * Release candidate
";
        let entry = parse_latest_entry(text).unwrap();

        assert_eq!(entry.description, "* Initial release");
        assert_eq!(entry.maintainer, None);
    }

    #[test]
    fn parse_latest_entry_rejects_text_without_header() {
        assert_eq!(parse_latest_entry(""), None);
        assert_eq!(parse_latest_entry("not a changelog\n"), None);
    }
}
