//! Request dispatcher: decides which source adapters a query should reach.
//!
//! Dispatch is pure and deterministic. It never touches the network and an
//! unrecognized query simply yields no tasks.

use std::fmt;

use tracing::{debug, info};

use crate::query::Query;
use crate::record::Architecture;

/// Supported Linux distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Distro {
    Ubuntu,
    Fedora,
    Debian,
    LinuxMint,
}

/// Distro keywords in match order; the first keyword found in the query wins.
const DISTRO_KEYWORDS: [(&str, Distro); 5] = [
    ("ubuntu", Distro::Ubuntu),
    ("fedora", Distro::Fedora),
    ("debian", Distro::Debian),
    ("linux mint", Distro::LinuxMint),
    ("mint", Distro::LinuxMint),
];

const WINDOWS_KEYWORD: &str = "windows";

/// Windows releases Microsoft no longer serves directly.
const LEGACY_WINDOWS_VERSIONS: [&str; 4] = ["vista", "7", "8", "8.1"];

/// Windows releases known by name rather than number.
const NAMED_WINDOWS_VERSIONS: [&str; 2] = ["vista", "xp"];

/// Bare numbers that name a bitness, not a release.
const BITNESS_NUMBERS: [&str; 2] = ["32", "64"];

impl Distro {
    /// Finds the first known distro keyword contained in a lower-cased query.
    #[must_use]
    pub fn detect(query_lower: &str) -> Option<Self> {
        DISTRO_KEYWORDS
            .iter()
            .find(|(keyword, _)| query_lower.contains(keyword))
            .map(|(_, distro)| *distro)
    }

    /// Keywords naming this distro, longest first.
    #[must_use]
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Ubuntu => &["ubuntu"],
            Self::Fedora => &["fedora"],
            Self::Debian => &["debian"],
            Self::LinuxMint => &["linux mint", "mint"],
        }
    }

    /// Strips the distro keywords from a query, leaving the version part.
    ///
    /// `"Ubuntu 24.04"` becomes `"24.04"`; a bare distro name becomes `""`.
    #[must_use]
    pub fn version_part(self, query: &str) -> String {
        let mut rest = query.to_lowercase();
        for keyword in self.keywords() {
            rest = rest.replace(keyword, "");
        }
        rest.trim().to_string()
    }
}

/// Identity of a source adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdapterId {
    Ubuntu,
    Fedora,
    Debian,
    LinuxMint,
    Windows,
    DistroWatch,
    Linuxtracker,
}

impl AdapterId {
    /// Stable adapter name used in logs and configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Fedora => "fedora",
            Self::Debian => "debian",
            Self::LinuxMint => "linux-mint",
            Self::Windows => "windows",
            Self::DistroWatch => "distrowatch",
            Self::Linuxtracker => "linuxtracker",
        }
    }

    /// Parses an adapter name as produced by [`Self::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Ubuntu,
            Self::Fedora,
            Self::Debian,
            Self::LinuxMint,
            Self::Windows,
            Self::DistroWatch,
            Self::Linuxtracker,
        ]
        .into_iter()
        .find(|id| id.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Official-site adapter for a distro.
    #[must_use]
    pub fn official_for(distro: Distro) -> Self {
        match distro {
            Distro::Ubuntu => Self::Ubuntu,
            Distro::Fedora => Self::Fedora,
            Distro::Debian => Self::Debian,
            Distro::LinuxMint => Self::LinuxMint,
        }
    }

    /// Returns true for generic torrent-index adapters.
    #[must_use]
    pub fn is_torrent_index(self) -> bool {
        matches!(self, Self::DistroWatch | Self::Linuxtracker)
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One unit of adapter work. Each adapter reads only the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterTask {
    /// Adapter to run.
    pub adapter: AdapterId,
    /// Search string, with the requested version appended when missing.
    pub query: String,
    /// Requested (or, for Windows, inferred) version.
    pub version: Option<String>,
    /// Architecture hint for adapters that phrase searches by architecture.
    pub architecture: Option<Architecture>,
}

/// Maps queries to adapter tasks.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    torrent_indexes: Vec<AdapterId>,
}

impl Dispatcher {
    /// Creates a dispatcher scheduling the given torrent indexes for distro queries.
    ///
    /// Entries that are not torrent-index adapters are ignored.
    #[must_use]
    pub fn new(torrent_indexes: Vec<AdapterId>) -> Self {
        let mut kept: Vec<AdapterId> = Vec::with_capacity(torrent_indexes.len());
        for id in torrent_indexes {
            if id.is_torrent_index() && !kept.contains(&id) {
                kept.push(id);
            }
        }
        Self {
            torrent_indexes: kept,
        }
    }

    /// Torrent indexes scheduled alongside official distro adapters.
    #[must_use]
    pub fn torrent_indexes(&self) -> &[AdapterId] {
        &self.torrent_indexes
    }

    /// Builds the ordered task list for a query.
    #[must_use]
    #[tracing::instrument(skip(self), fields(query = %query.text))]
    pub fn dispatch(&self, query: &Query) -> Vec<AdapterTask> {
        let query_lower = query.lowercase();
        let search_text = query.search_text();
        let requested_arch = query
            .architecture
            .as_deref()
            .and_then(Architecture::from_label);
        let mut tasks = Vec::new();

        if let Some(distro) = Distro::detect(&query_lower) {
            debug!(?distro, "matched distro keyword");
            tasks.push(AdapterTask {
                adapter: AdapterId::official_for(distro),
                query: search_text.clone(),
                version: query.version.clone(),
                architecture: requested_arch,
            });
            for index in &self.torrent_indexes {
                tasks.push(AdapterTask {
                    adapter: *index,
                    query: search_text.clone(),
                    version: query.version.clone(),
                    architecture: requested_arch,
                });
            }
        }

        if query_lower.contains(WINDOWS_KEYWORD) {
            push_windows_tasks(query, &query_lower, &search_text, requested_arch, &mut tasks);
        }

        if tasks.is_empty() {
            info!("no source adapter matches query");
        }
        tasks
    }
}

fn push_windows_tasks(
    query: &Query,
    query_lower: &str,
    search_text: &str,
    requested_arch: Option<Architecture>,
    tasks: &mut Vec<AdapterTask>,
) {
    let version = query
        .version
        .clone()
        .or_else(|| windows_version_hint(query_lower));
    let architecture = if query.architecture.is_some() {
        requested_arch
    } else {
        Architecture::infer_from_text(query_lower)
    };
    let is_legacy = query.version.as_deref().is_some_and(|v| {
        LEGACY_WINDOWS_VERSIONS.contains(&v.to_ascii_lowercase().as_str())
    });

    if is_legacy && query.architecture.is_none() && architecture.is_none() {
        for arch in [Architecture::X86_64, Architecture::I386] {
            tasks.push(AdapterTask {
                adapter: AdapterId::Windows,
                query: search_text.to_string(),
                version: version.clone(),
                architecture: Some(arch),
            });
        }
        return;
    }

    tasks.push(AdapterTask {
        adapter: AdapterId::Windows,
        query: search_text.to_string(),
        version,
        architecture,
    });
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(vec![AdapterId::DistroWatch, AdapterId::Linuxtracker])
    }
}

/// Returns the token following "windows" in a lower-cased query when it
/// reads as a release: `10`, `8.1`, `2019`, `vista`, `xp`.
fn windows_version_hint(query_lower: &str) -> Option<String> {
    let mut tokens = query_lower.split_whitespace();
    tokens.find(|token| *token == WINDOWS_KEYWORD)?;
    tokens
        .next()
        .filter(|token| is_windows_release(token))
        .map(ToString::to_string)
}

fn is_windows_release(token: &str) -> bool {
    if NAMED_WINDOWS_VERSIONS.contains(&token) {
        return true;
    }
    token.starts_with(|c: char| c.is_ascii_digit())
        && token.chars().all(|c| c.is_ascii_digit() || c == '.')
        && !BITNESS_NUMBERS.contains(&token)
}
