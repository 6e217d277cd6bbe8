use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::release::model::{ReleaseSupportPhase, ReleaseType};

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Product name of the channels in the built-in manifest
pub const DEFAULT_PRODUCT: &str = ".NET";

/// Channel manifest picked up from the data directory when none is given
pub const MANIFEST_FILE_NAME: &str = "channels.json";

const APP_NAME: &str = "dotnet-archive-releases";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Channels to generate release metadata for
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelManifest {
    /// Base URL the `releases.json` links of the index point to.
    /// Links are relative (`8.0/releases.json`) when unset.
    #[serde(default)]
    pub releases_base_url: Option<String>,
    pub channels: Vec<ChannelEntry>,
}

/// Static metadata of a channel
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelEntry {
    pub channel_version: String,
    #[serde(default = "default_product")]
    pub product: String,
    pub support_phase: ReleaseSupportPhase,
    pub release_type: ReleaseType,
    #[serde(default)]
    pub eol_date: Option<NaiveDate>,
    /// Source package publishing the channel, e.g. `dotnet8`
    pub source_package_name: String,
    #[serde(default)]
    pub lifecycle_policy: Option<String>,
    #[serde(default)]
    pub supported_os_json: Option<String>,
}

fn default_product() -> String {
    DEFAULT_PRODUCT.to_string()
}

impl ChannelManifest {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Manifest of a run: `explicit` when given, else [`MANIFEST_FILE_NAME`]
    /// in `data_dir` when present, else [`ChannelManifest::builtin`].
    pub fn locate(explicit: Option<&Path>, data_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let path = data_dir.join(MANIFEST_FILE_NAME);
        if path.is_file() {
            info!("Using channel manifest {}", path.display());
            Self::load(&path)
        } else {
            debug!("No channel manifest in {}, using built-in channels", data_dir.display());
            Ok(Self::builtin())
        }
    }

    /// Channels published through the Ubuntu archive
    pub fn builtin() -> Self {
        let channel = |version: &str,
                       support_phase: ReleaseSupportPhase,
                       release_type: ReleaseType,
                       eol_date: Option<NaiveDate>,
                       source_package_name: &str| ChannelEntry {
            channel_version: version.to_string(),
            product: default_product(),
            support_phase,
            release_type,
            eol_date,
            source_package_name: source_package_name.to_string(),
            lifecycle_policy: None,
            supported_os_json: None,
        };

        Self {
            releases_base_url: None,
            channels: vec![
                channel(
                    "9.0",
                    ReleaseSupportPhase::Active,
                    ReleaseType::Sts,
                    NaiveDate::from_ymd_opt(2026, 5, 12),
                    "dotnet9",
                ),
                channel(
                    "8.0",
                    ReleaseSupportPhase::Active,
                    ReleaseType::Lts,
                    NaiveDate::from_ymd_opt(2026, 11, 10),
                    "dotnet8",
                ),
                channel(
                    "7.0",
                    ReleaseSupportPhase::Eol,
                    ReleaseType::Sts,
                    NaiveDate::from_ymd_opt(2024, 5, 14),
                    "dotnet7",
                ),
                channel(
                    "6.0",
                    ReleaseSupportPhase::Eol,
                    ReleaseType::Lts,
                    NaiveDate::from_ymd_opt(2024, 11, 12),
                    "dotnet6",
                ),
            ],
        }
    }

    /// Link to the `releases.json` of `channel_version`
    pub fn releases_json_url(&self, channel_version: &str) -> String {
        match &self.releases_base_url {
            Some(base) => format!(
                "{}/{}/releases.json",
                base.trim_end_matches('/'),
                channel_version
            ),
            None => format!("{}/releases.json", channel_version),
        }
    }
}

/// Data directory: `$XDG_DATA_HOME/dotnet-archive-releases`, falling back to
/// `~/.local/share/dotnet-archive-releases`, or `./dotnet-archive-releases`
/// when no home directory is known. Holds the log file and an optional
/// channel manifest.
pub fn data_dir() -> PathBuf {
    resolve_data_dir(std::env::var_os("XDG_DATA_HOME"), dirs::home_dir())
}

pub fn log_path() -> PathBuf {
    data_dir().join(format!("{}.log", APP_NAME))
}

fn resolve_data_dir(xdg_data_home: Option<OsString>, home_dir: Option<PathBuf>) -> PathBuf {
    // An empty XDG_DATA_HOME counts as unset
    xdg_data_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}
