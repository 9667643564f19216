//! Windows adapter: Microsoft software-download pages plus the Internet
//! Archive catalog.
//!
//! Microsoft only serves Windows 10 and 11. Their pages usually hand out
//! images through a media tool rather than plain links, so when a page has
//! no `.iso` anchor the page itself is returned as an
//! [`SourceKind::OfficialPageOnly`] record.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::dispatch::{AdapterId, AdapterTask};
use crate::record::{LinkRecord, SourceKind};
use crate::user_agent::BROWSER_USER_AGENT;

use super::http_client::{SourceTimeouts, build_source_http_client};
use super::internet_archive::InternetArchiveSearch;
use super::page::fetch_page;
use super::utils::{ISO_MARKER, collect_targets, dedup_by_url};
use super::{SourceAdapter, SourceError};

/// Default Microsoft base URL.
const DEFAULT_MICROSOFT_BASE_URL: &str = "https://www.microsoft.com";

const WINDOWS_11_PATH: &str = "/en-us/software-download/windows11";
const WINDOWS_10_PATH: &str = "/en-us/software-download/windows10ISO";

/// Source adapter for Windows installer media.
#[derive(Debug, Clone)]
pub struct WindowsAdapter {
    client: Client,
    microsoft_base_url: String,
    archive: InternetArchiveSearch,
}

impl WindowsAdapter {
    /// Creates an adapter against the production Microsoft and archive.org hosts.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if client construction fails.
    pub fn new(timeouts: SourceTimeouts) -> Result<Self, SourceError> {
        let client = Self::build_client(timeouts)?;
        Ok(Self {
            archive: InternetArchiveSearch::new(client.clone()),
            client,
            microsoft_base_url: DEFAULT_MICROSOFT_BASE_URL.to_string(),
        })
    }

    /// Creates an adapter against alternate hosts (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if client construction fails.
    pub fn with_base_urls(
        microsoft_base_url: &str,
        archive_base_url: &str,
        timeouts: SourceTimeouts,
    ) -> Result<Self, SourceError> {
        let client = Self::build_client(timeouts)?;
        Ok(Self {
            archive: InternetArchiveSearch::with_base_url(client.clone(), archive_base_url),
            client,
            microsoft_base_url: microsoft_base_url.trim_end_matches('/').to_string(),
        })
    }

    // Microsoft serves a reduced page to non-browser agents.
    fn build_client(timeouts: SourceTimeouts) -> Result<Client, SourceError> {
        build_source_http_client(AdapterId::Windows.name(), BROWSER_USER_AGENT, timeouts)
    }

    /// Microsoft download page for the task, if Microsoft still serves that release.
    fn microsoft_page(&self, task: &AdapterTask) -> Option<String> {
        let query_lower = task.query.to_lowercase();
        let version = task.version.as_deref().map(str::to_lowercase);
        let path = if version.as_deref() == Some("11") || query_lower.contains("windows 11") {
            WINDOWS_11_PATH
        } else if version.as_deref() == Some("10") || query_lower.contains("windows 10") {
            WINDOWS_10_PATH
        } else {
            return None;
        };
        Some(format!("{}{path}", self.microsoft_base_url))
    }

    async fn fetch_microsoft_page(&self, url: &str) -> Result<Vec<LinkRecord>, SourceError> {
        let page = fetch_page(&self.client, AdapterId::Windows.name(), url).await?;
        let links = collect_targets(&page.anchors(), &[ISO_MARKER], SourceKind::Official);
        debug!(url, links = links.len(), "read Microsoft download page");
        if links.is_empty() {
            return Ok(vec![LinkRecord::new(url, SourceKind::OfficialPageOnly)]);
        }
        Ok(links)
    }
}

#[async_trait]
impl SourceAdapter for WindowsAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Windows
    }

    #[tracing::instrument(
        skip(self, task),
        fields(source = "windows", version = ?task.version, architecture = ?task.architecture)
    )]
    async fn fetch(&self, task: &AdapterTask) -> Result<Vec<LinkRecord>, SourceError> {
        let mut records = Vec::new();
        let mut attempts = 0_usize;
        let mut failures = 0_usize;
        let mut last_error = None;

        if let Some(url) = self.microsoft_page(task) {
            attempts += 1;
            match self.fetch_microsoft_page(&url).await {
                Ok(found) => records.extend(found),
                Err(error) => {
                    warn!(error = %error, "Microsoft download page unavailable");
                    failures += 1;
                    last_error = Some(error);
                }
            }
        }

        attempts += 1;
        match self
            .archive
            .search(task.version.as_deref(), task.architecture)
            .await
        {
            Ok(found) => records.extend(found),
            Err(error) => {
                warn!(error = %error, "Internet Archive search failed");
                failures += 1;
                last_error = Some(error);
            }
        }

        if failures == attempts
            && let Some(error) = last_error
        {
            return Err(error);
        }

        let unique = dedup_by_url(records);
        info!(links = unique.len(), "Windows search finished");
        Ok(unique)
    }
}
