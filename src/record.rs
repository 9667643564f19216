//! Link records: the unit of aggregation output.
//!
//! Every source adapter produces [`LinkRecord`]s tagged with the
//! [`SourceKind`] they came from. The reconciliation stage ranks sources
//! through a [`SourceRanking`], where a lower value means a more trusted
//! source.

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Priority assigned to sources missing from a [`SourceRanking`].
///
/// Always sorts after every ranked source.
pub const UNRANKED_PRIORITY: u8 = 99;

/// Origin of a link record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// Direct file link found on the vendor's own site.
    Official,
    /// Vendor landing page returned because no direct file link was discoverable.
    OfficialPageOnly,
    /// DistroWatch torrent archive.
    DistroWatch,
    /// Linuxtracker.org torrent index.
    Linuxtracker,
    /// Internet Archive catalog entry.
    InternetArchive,
}

impl SourceKind {
    /// All source kinds in default trust order.
    pub const ALL: [Self; 5] = [
        Self::Official,
        Self::OfficialPageOnly,
        Self::DistroWatch,
        Self::Linuxtracker,
        Self::InternetArchive,
    ];

    /// Returns the label used when records are serialized at the system boundary.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Official => "Official",
            Self::OfficialPageOnly => "Official (Page Link - Use Media Tool or follow instructions)",
            Self::DistroWatch => "DistroWatch",
            Self::Linuxtracker => "Linuxtracker",
            Self::InternetArchive => "Internet Archive",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for SourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// CPU architecture an installer image targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Architecture {
    X86_64,
    I386,
    Aarch64,
    Armhf,
    Ppc64el,
    S390x,
}

/// URL keyword to architecture mapping, checked in order.
///
/// 64-bit markers come before `x86` because longer tokens such as `x86_64`
/// contain the 32-bit marker.
const URL_ARCH_MARKERS: [(&str, Architecture); 12] = [
    ("amd64", Architecture::X86_64),
    ("x86_64", Architecture::X86_64),
    ("i386", Architecture::I386),
    ("i686", Architecture::I386),
    ("x86", Architecture::I386),
    ("arm64", Architecture::Aarch64),
    ("aarch64", Architecture::Aarch64),
    ("armhf", Architecture::Armhf),
    ("armv7", Architecture::Armhf),
    ("ppc64", Architecture::Ppc64el),
    ("powerpc64", Architecture::Ppc64el),
    ("s390x", Architecture::S390x),
];

impl Architecture {
    /// Returns the canonical lowercase label (e.g. `x86_64`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::I386 => "i386",
            Self::Aarch64 => "aarch64",
            Self::Armhf => "armhf",
            Self::Ppc64el => "ppc64el",
            Self::S390x => "s390x",
        }
    }

    /// Parses a canonical label, case-insensitively.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        [
            Self::X86_64,
            Self::I386,
            Self::Aarch64,
            Self::Armhf,
            Self::Ppc64el,
            Self::S390x,
        ]
        .into_iter()
        .find(|arch| arch.as_str() == label)
    }

    /// Infers the architecture from keywords embedded in a URL or file path.
    #[must_use]
    pub fn infer_from_url(url: &str) -> Option<Self> {
        let lower = url.to_ascii_lowercase();
        URL_ARCH_MARKERS
            .iter()
            .find(|(marker, _)| lower.contains(marker))
            .map(|(_, arch)| *arch)
    }

    /// Infers x86 bitness from free text such as a catalog title or a query.
    #[must_use]
    pub fn infer_from_text(text: &str) -> Option<Self> {
        let lower = text.to_ascii_lowercase();
        if ["64", "x64", "amd64"].iter().any(|k| lower.contains(k)) {
            Some(Self::X86_64)
        } else if ["32", "x86", "i386"].iter().any(|k| lower.contains(k)) {
            Some(Self::I386)
        } else {
            None
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Architecture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A candidate or final download link.
///
/// `url` is the identity key used for deduplication. Serialized with the
/// boundary keys `link`, `source`, and the optional `architecture`,
/// `version`, `title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    /// Canonical absolute URL.
    #[serde(rename = "link")]
    pub url: String,
    /// Where the record came from.
    pub source: SourceKind,
    /// Architecture inferred from the URL or title, when any signal exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<Architecture>,
    /// Version the record matched, set only by the version filter.
    #[serde(rename = "version", skip_serializing_if = "Option::is_none")]
    pub version_tag: Option<String>,
    /// Listing title for catalog sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl LinkRecord {
    /// Creates a record with no optional attributes.
    #[must_use]
    pub fn new(url: impl Into<String>, source: SourceKind) -> Self {
        Self {
            url: url.into(),
            source,
            architecture: None,
            version_tag: None,
            title: None,
        }
    }

    /// Creates a record whose architecture is inferred from its URL.
    #[must_use]
    pub fn from_url(url: impl Into<String>, source: SourceKind) -> Self {
        let url = url.into();
        let architecture = Architecture::infer_from_url(&url);
        Self {
            architecture,
            ..Self::new(url, source)
        }
    }

    #[must_use]
    pub fn with_architecture(mut self, architecture: Option<Architecture>) -> Self {
        self.architecture = architecture;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Total order over [`SourceKind`] used to break URL conflicts and sort output.
///
/// Lower values are more trusted. Kinds absent from the table get
/// [`UNRANKED_PRIORITY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRanking {
    ranks: HashMap<SourceKind, u8>,
}

impl SourceRanking {
    /// Builds a ranking from explicit `(kind, priority)` pairs.
    #[must_use]
    pub fn from_ranks(ranks: impl IntoIterator<Item = (SourceKind, u8)>) -> Self {
        Self {
            ranks: ranks.into_iter().collect(),
        }
    }

    /// Returns the priority of `kind`, or [`UNRANKED_PRIORITY`] if it is unranked.
    #[must_use]
    pub fn priority(&self, kind: SourceKind) -> u8 {
        self.ranks.get(&kind).copied().unwrap_or(UNRANKED_PRIORITY)
    }
}

impl Default for SourceRanking {
    fn default() -> Self {
        Self::from_ranks([
            (SourceKind::Official, 1),
            (SourceKind::OfficialPageOnly, 2),
            (SourceKind::DistroWatch, 3),
            (SourceKind::Linuxtracker, 4),
            (SourceKind::InternetArchive, 5),
        ])
    }
}
