//! Launchpad API changelog fetcher

use std::time::Duration;

use tracing::{debug, warn};

use crate::archive::changelog::ChangelogFetcher;
use crate::archive::error::FetchError;
use crate::archive::types::RawPublicationRecord;
use crate::config::FETCH_TIMEOUT_MS;

/// Fetches changelogs through the `changelogUrl` operation of a
/// publishing history entry.
pub struct HttpChangelogFetcher {
    client: reqwest::Client,
}

impl HttpChangelogFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dotnet-archive-releases/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;
        Ok(Self { client })
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Launchpad returned status {}: {}", status, url);
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl ChangelogFetcher for HttpChangelogFetcher {
    async fn fetch_changelog(&self, record: &RawPublicationRecord) -> Result<String, FetchError> {
        let operation_url = format!("{}?ws.op=changelogUrl", record.self_link);

        // The operation answers with a JSON string, e.g. "https://.../changelog"
        let body = self.get_text(&operation_url).await?;
        let changelog_url: String = serde_json::from_str(body.trim()).map_err(|e| {
            warn!("Failed to parse changelogUrl response: {}", e);
            FetchError::InvalidResponse(format!("changelogUrl: {}", e))
        })?;

        if changelog_url.is_empty() {
            return Err(FetchError::InvalidResponse(format!(
                "No changelog published for {}",
                record.source_package_version
            )));
        }

        debug!(
            "Fetching changelog of {} from {}",
            record.source_package_version, changelog_url
        );
        self.get_text(&changelog_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::types::{ArchivePocket, PublishingStatus};
    use mockito::{Matcher, Server};

    fn record(self_link: String) -> RawPublicationRecord {
        RawPublicationRecord {
            source_package_name: "dotnet8".to_string(),
            source_package_version: "8.0.100-8.0.0-0ubuntu2".to_string(),
            pocket: ArchivePocket::Security,
            status: PublishingStatus::Published,
            date_published: None,
            self_link,
        }
    }

    #[tokio::test]
    async fn fetch_changelog_follows_changelog_url() {
        let mut server = Server::new_async().await;

        let operation = server
            .mock("GET", "/ubuntu/+archive/primary/+sourcepub/42")
            .match_query(Matcher::UrlEncoded("ws.op".into(), "changelogUrl".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!("\"{}/changelogs/dotnet8\"", server.url()))
            .create_async()
            .await;

        let changelog = server
            .mock("GET", "/changelogs/dotnet8")
            .with_status(200)
            .with_body("dotnet8 (8.0.100-8.0.0-0ubuntu2) noble; urgency=medium\n")
            .create_async()
            .await;

        let fetcher = HttpChangelogFetcher::new().unwrap();
        let result = fetcher
            .fetch_changelog(&record(format!(
                "{}/ubuntu/+archive/primary/+sourcepub/42",
                server.url()
            )))
            .await;

        operation.assert_async().await;
        changelog.assert_async().await;
        assert_eq!(
            result.unwrap(),
            "dotnet8 (8.0.100-8.0.0-0ubuntu2) noble; urgency=medium\n"
        );
    }

    #[tokio::test]
    async fn fetch_changelog_returns_unexpected_status() {
        let mut server = Server::new_async().await;

        let _mock = server
            .mock("GET", "/ubuntu/+archive/primary/+sourcepub/404")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpChangelogFetcher::new().unwrap();
        let result = fetcher
            .fetch_changelog(&record(format!(
                "{}/ubuntu/+archive/primary/+sourcepub/404",
                server.url()
            )))
            .await;

        assert!(matches!(
            result,
            Err(FetchError::UnexpectedStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn fetch_changelog_rejects_non_string_response() {
        let mut server = Server::new_async().await;

        let _mock = server
            .mock("GET", "/ubuntu/+archive/primary/+sourcepub/7")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let fetcher = HttpChangelogFetcher::new().unwrap();
        let result = fetcher
            .fetch_changelog(&record(format!(
                "{}/ubuntu/+archive/primary/+sourcepub/7",
                server.url()
            )))
            .await;

        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_changelog_rejects_empty_changelog_url() {
        let mut server = Server::new_async().await;

        let _mock = server
            .mock("GET", "/ubuntu/+archive/primary/+sourcepub/8")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("\"\"")
            .create_async()
            .await;

        let fetcher = HttpChangelogFetcher::new().unwrap();
        let result = fetcher
            .fetch_changelog(&record(format!(
                "{}/ubuntu/+archive/primary/+sourcepub/8",
                server.url()
            )))
            .await;

        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }
}
