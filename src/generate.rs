//! Release metadata generation for all configured channels

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use thiserror::Error;
use tracing::{error, info};

use crate::archive::types::{RawPublicationRecord, parse_records};
use crate::config::{ChannelEntry, ChannelManifest};
use crate::release::error::{ReconcileError, SummaryError};
use crate::release::model::{Channel, ChannelDetails, Index};
use crate::release::reconciler::ReleaseReconciler;
use crate::release::summary::summarize;

pub const INDEX_FILE_NAME: &str = "releases-index.json";
pub const RELEASES_FILE_NAME: &str = "releases.json";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Channel {channel}: {source}")]
    Reconcile {
        channel: String,
        #[source]
        source: ReconcileError,
    },

    #[error("Channel {channel}: {source}")]
    Summary {
        channel: String,
        #[source]
        source: SummaryError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid publishing history {}: {source}", path.display())]
    InvalidHistory {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Publishing records grouped by source package name
#[derive(Debug, Clone, Default)]
pub struct PublishingHistory {
    records: HashMap<String, Vec<RawPublicationRecord>>,
}

impl PublishingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, records: impl IntoIterator<Item = RawPublicationRecord>) {
        for record in records {
            self.records
                .entry(record.source_package_name.clone())
                .or_default()
                .push(record);
        }
    }

    pub fn records_for(&self, source_package_name: &str) -> &[RawPublicationRecord] {
        self.records
            .get(source_package_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Load every `*.json` publishing history page in `dir`
    pub fn load_dir(dir: &Path) -> Result<Self, GenerateError> {
        let io_error = |source| GenerateError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_error)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()
            .map_err(io_error)?;
        paths.retain(|path| path.extension().is_some_and(|ext| ext == "json"));
        paths.sort();

        let mut history = Self::new();
        for path in paths {
            let text = fs::read_to_string(&path).map_err(|source| GenerateError::Io {
                path: path.clone(),
                source,
            })?;
            let records = parse_records(&text).map_err(|source| GenerateError::InvalidHistory {
                path: path.clone(),
                source,
            })?;
            info!("Loaded {} records from {}", records.len(), path.display());
            history.insert(records);
        }

        Ok(history)
    }
}

/// Generated release metadata
#[derive(Debug)]
pub struct GeneratedFiles {
    pub index: Index,
    /// One `releases.json` per channel of the index, in the same order
    pub channels: Vec<ChannelDetails>,
    /// Channels that could not be generated
    pub errors: Vec<GenerateError>,
}

impl GeneratedFiles {
    /// Write `releases-index.json` and `<channel>/releases.json` below `dir`
    pub fn write_to(&self, dir: &Path) -> Result<(), GenerateError> {
        create_dir(dir)?;

        let index_path = dir.join(INDEX_FILE_NAME);
        write_file(&index_path, &serde_json::to_string(&self.index)?)?;
        info!("Releases index written to {}", index_path.display());

        for details in &self.channels {
            let channel_dir = dir.join(&details.channel_version);
            create_dir(&channel_dir)?;

            let path = channel_dir.join(RELEASES_FILE_NAME);
            write_file(&path, &serde_json::to_string_pretty(details)?)?;
            info!(
                "Release history for channel {} written to {}",
                details.channel_version,
                path.display()
            );
        }

        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<(), GenerateError> {
    fs::create_dir_all(dir).map_err(|source| GenerateError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), GenerateError> {
    fs::write(path, contents).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reconcile and summarize every channel of `manifest` concurrently.
///
/// A failing channel is left out of the index and reported in
/// [`GeneratedFiles::errors`]; the other channels are unaffected.
pub async fn generate(
    manifest: &ChannelManifest,
    history: &PublishingHistory,
    reconciler: &ReleaseReconciler,
) -> GeneratedFiles {
    let results = join_all(
        manifest
            .channels
            .iter()
            .map(|channel| generate_channel(manifest, channel, history, reconciler)),
    )
    .await;

    let mut index = Vec::new();
    let mut channels = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok((entry, details)) => {
                index.push(entry);
                channels.push(details);
            }
            Err(e) => {
                error!("{}", e);
                errors.push(e);
            }
        }
    }

    GeneratedFiles {
        index: Index {
            releases_index: index,
        },
        channels,
        errors,
    }
}

async fn generate_channel(
    manifest: &ChannelManifest,
    channel: &ChannelEntry,
    history: &PublishingHistory,
    reconciler: &ReleaseReconciler,
) -> Result<(Channel, ChannelDetails), GenerateError> {
    let channel_version = &channel.channel_version;
    info!(
        "Processing channel {} ({})",
        channel_version, channel.source_package_name
    );

    let records = history.records_for(&channel.source_package_name);
    let reconciliation = reconciler
        .reconcile(channel_version, records)
        .await
        .map_err(|source| GenerateError::Reconcile {
            channel: channel_version.clone(),
            source,
        })?;

    let summary =
        summarize(channel, &reconciliation.releases).map_err(|source| GenerateError::Summary {
            channel: channel_version.clone(),
            source,
        })?;

    info!(
        "Channel {} latest release {} (runtime {}, sdk {}), security: {}",
        channel_version,
        summary.latest_release,
        summary.latest_runtime,
        summary.latest_sdk,
        summary.security
    );

    let entry = Channel::new(
        &summary,
        manifest.releases_json_url(channel_version),
        channel.supported_os_json.clone(),
    );
    let details = ChannelDetails::new(
        &summary,
        &reconciliation.releases,
        channel.lifecycle_policy.clone(),
    );

    Ok((entry, details))
}
