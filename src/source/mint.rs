//! Linux Mint download pages and their per-edition pages.

use crate::dispatch::Distro;

use super::official::{OfficialSiteAdapter, SiteProfile};
use super::page::Anchor;
use super::utils::{ISO_MARKER, TORRENT_MARKER};

const SITE_BASE: &str = "https://www.linuxmint.com";
const EDITION_PAGE_MARKER: &str = "edition.php?id=";

/// Linux Mint official-site adapter.
pub type LinuxMintAdapter = OfficialSiteAdapter<LinuxMintProfile>;

#[derive(Debug, Clone)]
pub struct LinuxMintProfile {
    site_base: String,
}

impl LinuxMintProfile {
    #[must_use]
    pub fn with_base_url(site_base: &str) -> Self {
        Self {
            site_base: site_base.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for LinuxMintProfile {
    fn default() -> Self {
        Self::with_base_url(SITE_BASE)
    }
}

impl SiteProfile for LinuxMintProfile {
    fn distro(&self) -> Distro {
        Distro::LinuxMint
    }

    fn landing_pages(&self, _version: &str) -> Vec<String> {
        ["download.php", "download_all.php", "download_lmde.php"]
            .iter()
            .map(|page| format!("{}/{page}", self.site_base))
            .collect()
    }

    // Edition pages carry the mirror and torrent links, so they are followed
    // whether or not a version was asked for.
    fn sub_pages(&self, anchors: &[Anchor], _version: &str) -> Vec<String> {
        anchors
            .iter()
            .filter(|anchor| anchor.url.contains(EDITION_PAGE_MARKER))
            .map(|anchor| anchor.url.clone())
            .collect()
    }

    fn sub_page_markers(&self) -> &'static [&'static str] {
        &[ISO_MARKER, TORRENT_MARKER]
    }
}
