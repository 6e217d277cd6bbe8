//! Channel-level summary of reconciled releases

use chrono::NaiveDate;

use crate::config::ChannelEntry;
use crate::release::error::SummaryError;
use crate::release::model::{ReleaseSupportPhase, ReleaseType};
use crate::release::reconciler::ReconciledRelease;
use crate::version::product::ProductVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub channel_version: String,
    pub product: String,
    pub latest: ReconciledRelease,
    pub latest_release: ProductVersion,
    pub latest_runtime: ProductVersion,
    pub latest_sdk: ProductVersion,
    pub latest_release_date: NaiveDate,
    /// Security flag of the latest release
    pub security: bool,
    pub support_phase: ReleaseSupportPhase,
    pub release_type: ReleaseType,
    pub eol_date: Option<NaiveDate>,
}

/// Summarize `releases` for the channel described by `channel`.
///
/// The latest release is the one with the latest release date, the higher
/// version winning on the same date.
pub fn summarize(
    channel: &ChannelEntry,
    releases: &[ReconciledRelease],
) -> Result<ChannelSummary, SummaryError> {
    let latest = releases
        .iter()
        .max_by(|a, b| {
            a.release_date
                .cmp(&b.release_date)
                .then_with(|| a.version.cmp(&b.version))
        })
        .ok_or(SummaryError::EmptyReleaseSet)?;

    Ok(ChannelSummary {
        channel_version: channel.channel_version.clone(),
        product: channel.product.clone(),
        latest_release: latest.version,
        latest_runtime: latest.runtime.unwrap_or(latest.version),
        latest_sdk: latest.sdk,
        latest_release_date: latest.release_date,
        security: latest.security,
        support_phase: channel.support_phase,
        release_type: channel.release_type,
        eol_date: channel.eol_date,
        latest: latest.clone(),
    })
}
