//! Fedora download pages and, for numbered releases, the mirror directories.

use crate::dispatch::Distro;

use super::official::{OfficialSiteAdapter, SiteProfile};

const SITE_BASE: &str = "https://fedoraproject.org";
const MIRROR_BASE: &str = "https://download.fedoraproject.org/pub/fedora/linux/releases";

/// Editions whose images are listed in the release mirror tree.
const EDITIONS: [&str; 2] = ["Workstation", "Server"];

/// Fedora official-site adapter.
pub type FedoraAdapter = OfficialSiteAdapter<FedoraProfile>;

#[derive(Debug, Clone)]
pub struct FedoraProfile {
    site_base: String,
    mirror_base: String,
}

impl FedoraProfile {
    #[must_use]
    pub fn with_base_urls(site_base: &str, mirror_base: &str) -> Self {
        Self {
            site_base: site_base.trim_end_matches('/').to_string(),
            mirror_base: mirror_base.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for FedoraProfile {
    fn default() -> Self {
        Self::with_base_urls(SITE_BASE, MIRROR_BASE)
    }
}

impl SiteProfile for FedoraProfile {
    fn distro(&self) -> Distro {
        Distro::Fedora
    }

    fn landing_pages(&self, version: &str) -> Vec<String> {
        let mut pages = vec![
            format!("{}/workstation/download/", self.site_base),
            format!("{}/server/download/", self.site_base),
        ];
        if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) {
            pages.extend(
                EDITIONS
                    .iter()
                    .map(|edition| format!("{}/{version}/{edition}/x86_64/iso/", self.mirror_base)),
            );
        }
        pages
    }
}
