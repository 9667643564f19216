//! DistroWatch torrent archive adapter.
//!
//! The archive is a single page listing recent release torrents inside the
//! `News1` cell. Each row pairs a description with a download link.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::dispatch::{AdapterId, AdapterTask};
use crate::record::{LinkRecord, SourceKind};
use crate::user_agent;

use super::http_client::{SourceTimeouts, build_source_http_client};
use super::page::{extract_anchors, fetch_page, table_at, table_rows, text_content};
use super::utils::{dedup_by_url, is_torrent_target, matches_all_tokens};
use super::{SourceAdapter, SourceError};

/// Default DistroWatch base URL.
const DEFAULT_BASE_URL: &str = "https://distrowatch.com";
const ARCHIVE_PATH: &str = "/dwres.php?resource=bittorrent";
const LISTING_MARKER: &str = "News1";

/// Source adapter for the DistroWatch torrent archive.
#[derive(Debug, Clone)]
pub struct DistroWatchAdapter {
    client: Client,
    base_url: String,
}

impl DistroWatchAdapter {
    /// # Errors
    ///
    /// Returns [`SourceError`] if client construction fails.
    pub fn new(timeouts: SourceTimeouts) -> Result<Self, SourceError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeouts)
    }

    /// # Errors
    ///
    /// Returns [`SourceError`] if client construction fails.
    pub fn with_base_url(base_url: &str, timeouts: SourceTimeouts) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_source_http_client(
                AdapterId::DistroWatch.name(),
                &user_agent::default_source_user_agent(),
                timeouts,
            )?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Torrent links from archive rows whose description contains every query token.
fn parse_listing(listing: &str, base: &Url, query: &str) -> Vec<LinkRecord> {
    table_rows(listing)
        .into_iter()
        .filter(|cells| cells.len() >= 2)
        .filter_map(|cells| {
            let description = text_content(cells[0]);
            if !matches_all_tokens(&description, query) {
                return None;
            }
            let link_cell = cells[cells.len() - 1];
            let target = extract_anchors(link_cell, base).into_iter().next()?;
            if !is_torrent_target(&target.url) {
                return None;
            }
            debug!(description = %description, url = %target.url, "archive row matched");
            Some(LinkRecord::from_url(target.url, SourceKind::DistroWatch))
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for DistroWatchAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::DistroWatch
    }

    #[tracing::instrument(skip(self, task), fields(source = "distrowatch", query = %task.query))]
    async fn fetch(&self, task: &AdapterTask) -> Result<Vec<LinkRecord>, SourceError> {
        let url = format!("{}{ARCHIVE_PATH}", self.base_url);
        let page = fetch_page(&self.client, self.id().name(), &url).await?;
        let listing = table_at(&page.html, LISTING_MARKER).ok_or_else(|| {
            SourceError::unexpected_markup(self.id().name(), &url, "torrent archive cell missing")
        })?;

        let records = dedup_by_url(parse_listing(listing, &page.url, &task.query));
        info!(links = records.len(), "DistroWatch archive scanned");
        Ok(records)
    }
}
