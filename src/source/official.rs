//! Official-site crawler shared by the per-distro adapters.
//!
//! A [`SiteProfile`] says which landing pages to read for a version and
//! which discovered links deserve one more fetch. The crawler does the rest:
//! fetch, extract target files, follow one level of sub-pages, dedupe.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::dispatch::{AdapterId, AdapterTask, Distro};
use crate::record::{LinkRecord, SourceKind};
use crate::user_agent;

use super::http_client::{SourceTimeouts, build_source_http_client};
use super::page::{Anchor, fetch_page};
use super::utils::{ISO_MARKER, collect_targets, dedup_by_url};
use super::{SourceAdapter, SourceError};

/// Site-specific knowledge for one distro's official download pages.
pub trait SiteProfile: Send + Sync {
    /// Distro this site publishes.
    fn distro(&self) -> Distro;

    /// Pages to read first. `version` may be empty.
    fn landing_pages(&self, version: &str) -> Vec<String>;

    /// Links on a landing page worth one more fetch.
    fn sub_pages(&self, _anchors: &[Anchor], _version: &str) -> Vec<String> {
        Vec::new()
    }

    /// Markers a landing-page link must contain to count as a target file.
    fn markers(&self) -> &'static [&'static str] {
        &[ISO_MARKER]
    }

    /// Markers accepted on sub-pages.
    fn sub_page_markers(&self) -> &'static [&'static str] {
        self.markers()
    }
}

/// Source adapter crawling a distro's official site.
pub struct OfficialSiteAdapter<P> {
    client: Client,
    profile: P,
}

impl<P: SiteProfile> OfficialSiteAdapter<P> {
    /// Creates an adapter for `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if client construction fails.
    pub fn new(profile: P, timeouts: SourceTimeouts) -> Result<Self, SourceError> {
        let id = AdapterId::official_for(profile.distro());
        Ok(Self {
            client: build_source_http_client(
                id.name(),
                &user_agent::default_source_user_agent(),
                timeouts,
            )?,
            profile,
        })
    }

    /// Version to crawl for: the requested one, else the first token left
    /// after removing the distro name from the search string.
    fn crawl_version(&self, task: &AdapterTask) -> String {
        task.version.clone().unwrap_or_else(|| {
            self.profile
                .distro()
                .version_part(&task.query)
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string()
        })
    }

    async fn read_page(
        &self,
        url: &str,
        markers: &[&str],
        records: &mut Vec<LinkRecord>,
    ) -> Result<Vec<Anchor>, SourceError> {
        let name = self.id().name();
        let page = fetch_page(&self.client, name, url).await?;
        let anchors = page.anchors();
        let found = collect_targets(&anchors, markers, SourceKind::Official);
        debug!(source = name, url, links = found.len(), "collected target links");
        records.extend(found);
        Ok(anchors)
    }
}

impl<P> std::fmt::Debug for OfficialSiteAdapter<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfficialSiteAdapter").finish_non_exhaustive()
    }
}

#[async_trait]
impl<P: SiteProfile> SourceAdapter for OfficialSiteAdapter<P> {
    fn id(&self) -> AdapterId {
        AdapterId::official_for(self.profile.distro())
    }

    #[tracing::instrument(skip(self, task), fields(source = self.id().name(), query = %task.query))]
    async fn fetch(&self, task: &AdapterTask) -> Result<Vec<LinkRecord>, SourceError> {
        let version = self.crawl_version(task);
        let mut visited: HashSet<String> = HashSet::new();
        let mut sub_pages: Vec<String> = Vec::new();
        let mut records = Vec::new();
        let mut fetched_any = false;
        let mut last_error = None;

        for url in self.profile.landing_pages(&version) {
            if !visited.insert(url.clone()) {
                continue;
            }
            match self.read_page(&url, self.profile.markers(), &mut records).await {
                Ok(anchors) => {
                    fetched_any = true;
                    for sub_page in self.profile.sub_pages(&anchors, &version) {
                        if !visited.contains(&sub_page) && !sub_pages.contains(&sub_page) {
                            sub_pages.push(sub_page);
                        }
                    }
                }
                Err(error) => {
                    warn!(error = %error, "official page unavailable");
                    last_error = Some(error);
                }
            }
        }

        for url in sub_pages {
            if !visited.insert(url.clone()) {
                continue;
            }
            debug!(url = %url, "following sub-page");
            match self
                .read_page(&url, self.profile.sub_page_markers(), &mut records)
                .await
            {
                Ok(_) => fetched_any = true,
                Err(error) => warn!(error = %error, "official sub-page unavailable"),
            }
        }

        if !fetched_any && let Some(error) = last_error {
            return Err(error);
        }

        let unique = dedup_by_url(records);
        info!(links = unique.len(), "official site crawl finished");
        Ok(unique)
    }
}
