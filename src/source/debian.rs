//! Debian distribution pages and the cdimage.debian.org tree.

use crate::dispatch::Distro;

use super::official::{OfficialSiteAdapter, SiteProfile};
use super::page::Anchor;
use super::utils::directory_name;

const SITE_BASE: &str = "https://www.debian.org";
const CDIMAGE_BASE: &str = "https://cdimage.debian.org";

/// Directory names under cdimage worth descending into.
const CDIMAGE_TREES: [&str; 3] = ["debian-cd", "debian-live", "archive"];

/// Debian official-site adapter.
pub type DebianAdapter = OfficialSiteAdapter<DebianProfile>;

#[derive(Debug, Clone)]
pub struct DebianProfile {
    site_base: String,
    cdimage_base: String,
}

impl DebianProfile {
    #[must_use]
    pub fn with_base_urls(site_base: &str, cdimage_base: &str) -> Self {
        Self {
            site_base: site_base.trim_end_matches('/').to_string(),
            cdimage_base: cdimage_base.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for DebianProfile {
    fn default() -> Self {
        Self::with_base_urls(SITE_BASE, CDIMAGE_BASE)
    }
}

impl SiteProfile for DebianProfile {
    fn distro(&self) -> Distro {
        Distro::Debian
    }

    fn landing_pages(&self, version: &str) -> Vec<String> {
        let site = &self.site_base;
        let cdimage = &self.cdimage_base;
        let mut pages = vec![
            format!("{site}/distrib/"),
            format!("{site}/CD/http-ftp/"),
            format!("{site}/CD/live/"),
            format!("{cdimage}/debian-cd/current/amd64/iso-cd/"),
            format!("{cdimage}/debian-cd/current/amd64/iso-dvd/"),
            format!("{cdimage}/debian-cd/current-live/amd64/iso-hybrid/"),
        ];
        if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) {
            pages.push(format!("{cdimage}/cdimage/archive/{version}.0/amd64/iso-cd/"));
            pages.push(format!("{cdimage}/cdimage/archive/{version}.0/amd64/iso-dvd/"));
        }
        pages
    }

    fn sub_pages(&self, anchors: &[Anchor], version: &str) -> Vec<String> {
        if version.is_empty() {
            return Vec::new();
        }
        anchors
            .iter()
            .filter(|anchor| anchor.url.starts_with(&self.cdimage_base))
            .filter(|anchor| CDIMAGE_TREES.iter().any(|tree| anchor.url.contains(tree)))
            .filter(|anchor| directory_name(&anchor.url).is_some_and(|name| name.contains(version)))
            .map(|anchor| anchor.url.clone())
            .collect()
    }
}
