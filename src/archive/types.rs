//! Publishing history records as served by the Launchpad API

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Archive pocket a source was published to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchivePocket {
    Release,
    Security,
    Updates,
    Proposed,
    Backports,
}

/// Publishing status of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishingStatus {
    Pending,
    Published,
    Superseded,
    Deleted,
    Obsolete,
}

/// Implements case-insensitive `FromStr`, `Display` and string serde for a
/// fieldless enum, using the variant names as they appear on Launchpad.
macro_rules! launchpad_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case(stringify!($variant)) {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("invalid {}: {:?}", stringify!($name), s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

launchpad_enum!(ArchivePocket {
    Release,
    Security,
    Updates,
    Proposed,
    Backports,
});

launchpad_enum!(PublishingStatus {
    Pending,
    Published,
    Superseded,
    Deleted,
    Obsolete,
});

/// One `source_package_publishing_history` entry
///
/// Only the fields needed for reconciliation are kept; everything else in the
/// Launchpad payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPublicationRecord {
    pub source_package_name: String,
    pub source_package_version: String,
    pub pocket: ArchivePocket,
    pub status: PublishingStatus,
    #[serde(default)]
    pub date_published: Option<DateTime<Utc>>,
    /// API link of the entry; changelog and binary lookups hang off it
    pub self_link: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsDocument {
    Page { entries: Vec<RawPublicationRecord> },
    List(Vec<RawPublicationRecord>),
}

/// Parse publishing records from a collection page (`{"entries": [...]}`)
/// or a bare JSON array of entries.
pub fn parse_records(json: &str) -> Result<Vec<RawPublicationRecord>, serde_json::Error> {
    Ok(match serde_json::from_str(json)? {
        RecordsDocument::Page { entries } => entries,
        RecordsDocument::List(entries) => entries,
    })
}
