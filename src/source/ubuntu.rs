//! Ubuntu official download pages and the releases.ubuntu.com index.

use crate::dispatch::Distro;

use super::official::{OfficialSiteAdapter, SiteProfile};
use super::page::Anchor;
use super::utils::directory_name;

const SITE_BASE: &str = "https://ubuntu.com";
const RELEASES_BASE: &str = "https://releases.ubuntu.com";

/// Ubuntu official-site adapter.
pub type UbuntuAdapter = OfficialSiteAdapter<UbuntuProfile>;

/// Where Ubuntu publishes images.
#[derive(Debug, Clone)]
pub struct UbuntuProfile {
    site_base: String,
    releases_base: String,
}

impl UbuntuProfile {
    /// Points the profile at alternate hosts (used by tests).
    #[must_use]
    pub fn with_base_urls(site_base: &str, releases_base: &str) -> Self {
        Self {
            site_base: site_base.trim_end_matches('/').to_string(),
            releases_base: releases_base.trim_end_matches('/').to_string(),
        }
    }

    fn releases_index(&self) -> String {
        format!("{}/", self.releases_base)
    }
}

impl Default for UbuntuProfile {
    fn default() -> Self {
        Self::with_base_urls(SITE_BASE, RELEASES_BASE)
    }
}

/// Release directories are named by number (`24.04`) or codename (`noble`).
fn is_release_directory(name: &str) -> bool {
    let numeric = name.chars().all(|c| c.is_ascii_digit() || c == '.')
        && name.chars().any(|c| c.is_ascii_digit());
    let codename = name.chars().all(|c| c.is_ascii_alphabetic());
    numeric || codename
}

impl SiteProfile for UbuntuProfile {
    fn distro(&self) -> Distro {
        Distro::Ubuntu
    }

    fn landing_pages(&self, version: &str) -> Vec<String> {
        let mut pages = vec![
            format!("{}/download/desktop", self.site_base),
            format!("{}/download/server", self.site_base),
            self.releases_index(),
        ];
        if !version.is_empty()
            && (version.contains('.') || version.chars().all(|c| c.is_ascii_alphabetic()))
        {
            pages.push(format!("{}/{version}/", self.releases_base));
        }
        pages
    }

    fn sub_pages(&self, anchors: &[Anchor], version: &str) -> Vec<String> {
        if version.is_empty() {
            return Vec::new();
        }
        let index = self.releases_index();
        anchors
            .iter()
            .filter(|anchor| anchor.url.starts_with(&index))
            .filter(|anchor| {
                directory_name(&anchor.url)
                    .is_some_and(|name| is_release_directory(name) && name.contains(version))
            })
            .map(|anchor| anchor.url.clone())
            .collect()
    }
}
