//! CVE identifiers mentioned in changelog text

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Base URL of the Ubuntu security tracker
pub const UBUNTU_SECURITY_URL: &str = "https://ubuntu.com/security";

/// Unanchored: identifiers glued to surrounding text still count, and an
/// overlong sequence number yields its first seven digits.
static CVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CVE-\d{4}-\d{4,7}").expect("CVE pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cve {
    pub cve_id: String,
    pub cve_url: String,
}

impl Cve {
    pub fn new(id: impl Into<String>) -> Self {
        let cve_id = id.into();
        let cve_url = format!("{}/{}", UBUNTU_SECURITY_URL, cve_id);
        Self { cve_id, cve_url }
    }
}

/// Extract the distinct CVE identifiers of `text`, in order of first
/// appearance. Identifiers are normalized to an upper-case `CVE-` prefix.
pub fn extract_cves(text: &str) -> Vec<Cve> {
    let mut ids: Vec<String> = Vec::new();

    for m in CVE_RE.find_iter(text) {
        let id = m.as_str().to_ascii_uppercase();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    ids.into_iter().map(Cve::new).collect()
}
