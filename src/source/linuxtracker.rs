//! Linuxtracker.org search adapter.
//!
//! Search results come back as a `lista` table: a header row, then one row
//! per torrent with the name in the second cell and the download link in
//! the third. Rows with fewer than nine cells are layout, not results.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::dispatch::{AdapterId, AdapterTask};
use crate::record::{LinkRecord, SourceKind};
use crate::user_agent;

use super::http_client::{SourceTimeouts, build_source_http_client};
use super::page::{extract_anchors, fetch_page, table_at, table_rows};
use super::utils::{dedup_by_url, is_torrent_target, matches_all_tokens};
use super::{SourceAdapter, SourceError};

/// Default Linuxtracker base URL.
const DEFAULT_BASE_URL: &str = "https://linuxtracker.org";
const RESULTS_MARKER: &str = "class=\"lista\"";
const MIN_RESULT_CELLS: usize = 9;

/// Source adapter for the Linuxtracker torrent index.
#[derive(Debug, Clone)]
pub struct LinuxtrackerAdapter {
    client: Client,
    base_url: String,
}

impl LinuxtrackerAdapter {
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
                AdapterId::Linuxtracker.name(),
                &user_agent::default_source_user_agent(),
                timeouts,
            )?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/index.php?page=torrents&options=0&active=0&category=0&search={}",
            self.base_url,
            urlencoding::encode(query)
        )
    }
}

fn parse_results(table: &str, base: &Url, query: &str) -> Vec<LinkRecord> {
    table_rows(table)
        .into_iter()
        .skip(1)
        .filter(|cells| cells.len() >= MIN_RESULT_CELLS)
        .filter_map(|cells| {
            let name = extract_anchors(cells[1], base).into_iter().next()?.text;
            if !matches_all_tokens(&name, query) {
                return None;
            }
            let target = extract_anchors(cells[2], base).into_iter().next()?;
            if !is_torrent_target(&target.url) {
                return None;
            }
            debug!(name = %name, url = %target.url, "tracker row matched");
            Some(LinkRecord::from_url(target.url, SourceKind::Linuxtracker))
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for LinuxtrackerAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Linuxtracker
    }

    #[tracing::instrument(skip(self, task), fields(source = "linuxtracker", query = %task.query))]
    async fn fetch(&self, task: &AdapterTask) -> Result<Vec<LinkRecord>, SourceError> {
        let url = self.search_url(&task.query);
        let page = fetch_page(&self.client, self.id().name(), &url).await?;
        let table = table_at(&page.html, RESULTS_MARKER).ok_or_else(|| {
            SourceError::unexpected_markup(self.id().name(), &url, "torrent table missing")
        })?;

        let records = dedup_by_url(parse_results(table, &page.url, &task.query));
        info!(links = records.len(), "Linuxtracker search finished");
        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn result_row(name: &str, download: &str) -> String {
        format!(
            "<tr><td>cat</td><td><a href=\"index.php?page=torrent-details&amp;id=1\">{name}</a></td>\
             <td><a href=\"{download}\"><img src=\"dl.png\"></a></td>\
             <td>1</td><td>2</td><td>3</td><td>4</td><td>5</td><td>6</td></tr>"
        )
    }

    fn results_page(rows: &[String]) -> String {
        format!(
            "<html><table class=\"lista\"><tr><td>Cat</td><td>Name</td><td>DL</td></tr>{}</table></html>",
            rows.concat()
        )
    }

    fn timeouts() -> SourceTimeouts {
        SourceTimeouts::new(Duration::from_secs(2), Duration::from_secs(5))
    }

    fn task(query: &str) -> AdapterTask {
        AdapterTask {
            adapter: AdapterId::Linuxtracker,
            query: query.to_string(),
            version: None,
            architecture: None,
        }
    }

    #[test]
    fn test_search_url_encodes_query() {
        let adapter = LinuxtrackerAdapter::new(timeouts()).unwrap();
        assert_eq!(
            adapter.search_url("Debian 12 DVD"),
            "https://linuxtracker.org/index.php?page=torrents&options=0&active=0&category=0&search=Debian%2012%20DVD"
        );
    }

    #[tokio::test]
    async fn test_fetch_matches_rows_by_name_tokens() {
        let server = MockServer::start().await;
        let page = results_page(&[
            result_row("Debian 12.5 DVD amd64", "download.php?id=1&f=debian-12.5.0-amd64-DVD-1.iso.torrent"),
            result_row("Debian 11 DVD amd64", "download.php?id=2&f=debian-11.iso.torrent"),
            result_row("Debian 12 netinst", "index.php?page=torrent-details&id=3"),
            result_row("Debian 12 DVD i386", "magnet:?xt=urn:btih:cafe"),
        ]);
        Mock::given(method("GET"))
            .and(path("/index.php"))
            .and(query_param("search", "Debian 12"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = LinuxtrackerAdapter::with_base_url(&server.uri(), timeouts()).unwrap();
        let records = adapter.fetch(&task("Debian 12")).await.unwrap();

        let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        let expected = vec![
            format!(
                "{}/download.php?id=1&f=debian-12.5.0-amd64-DVD-1.iso.torrent",
                server.uri()
            ),
            "magnet:?xt=urn:btih:cafe".to_string(),
        ];
        assert_eq!(urls, expected);
        assert!(records.iter().all(|r| r.source == SourceKind::Linuxtracker));
    }

    #[tokio::test]
    async fn test_fetch_reads_only_the_first_results_table() {
        let server = MockServer::start().await;
        let page = format!(
            "{}<table class=\"lista\"><tr><td>Popular</td></tr>{}</table>",
            results_page(&[result_row(
                "Ubuntu 24.04 desktop",
                "download.php?id=1&f=ubuntu.torrent"
            )]),
            result_row("Ubuntu 24.04 popular", "download.php?id=9&f=popular.torrent"),
        );
        Mock::given(method("GET"))
            .and(path("/index.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let adapter = LinuxtrackerAdapter::with_base_url(&server.uri(), timeouts()).unwrap();
        let records = adapter.fetch(&task("ubuntu 24.04")).await.unwrap();

        let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        let expected = vec![format!("{}/download.php?id=1&f=ubuntu.torrent", server.uri())];
        assert_eq!(urls, expected);
    }

    #[tokio::test]
    async fn test_missing_results_table_is_unexpected_markup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Access denied</html>"))
            .mount(&server)
            .await;

        let adapter = LinuxtrackerAdapter::with_base_url(&server.uri(), timeouts()).unwrap();
        let result = adapter.fetch(&task("ubuntu")).await;
        assert!(matches!(result, Err(SourceError::UnexpectedMarkup { .. })));
    }
}
