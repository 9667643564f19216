//! Shared helpers for source adapters: target-file matching, query token
//! matching, and per-adapter deduplication.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::record::{LinkRecord, SourceKind};

use super::page::Anchor;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Checksum, signature and listing suffixes that are never installer media.
static NON_MEDIA_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)\.(sha\d*sum|md5sum|asc|sig|txt|zsync|manifest|list)$")
});

/// Installer image marker used by official sites.
pub const ISO_MARKER: &str = ".iso";

/// Torrent file marker accepted on pages that publish torrents next to images.
pub const TORRENT_MARKER: &str = ".torrent";

/// Returns true if `url` contains one of `markers` and is not a checksum,
/// signature or text file.
#[must_use]
pub fn is_target_file(url: &str, markers: &[&str]) -> bool {
    let lower = url.to_ascii_lowercase();
    markers
        .iter()
        .any(|marker| lower.contains(&marker.to_ascii_lowercase()))
        && !NON_MEDIA_SUFFIX_RE.is_match(&lower)
}

/// Returns true for `.torrent` files and magnet links.
#[must_use]
pub fn is_torrent_target(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.ends_with(TORRENT_MARKER) || lower.starts_with("magnet:")
}

/// Returns true if every whitespace-separated token of `query` occurs in `text`.
///
/// Both sides are lower-cased. An empty query matches everything.
#[must_use]
pub fn matches_all_tokens(text: &str, query: &str) -> bool {
    let text = text.to_lowercase();
    query
        .to_lowercase()
        .split_whitespace()
        .all(|token| text.contains(token))
}

/// Turns matching anchors into records, inferring architecture from the URL.
#[must_use]
pub fn collect_targets(
    anchors: &[Anchor],
    markers: &[&str],
    source: SourceKind,
) -> Vec<LinkRecord> {
    anchors
        .iter()
        .filter(|anchor| is_target_file(&anchor.url, markers))
        .map(|anchor| LinkRecord::from_url(anchor.url.clone(), source))
        .collect()
}

/// Drops later records whose URL was already seen, keeping first-seen order.
#[must_use]
pub fn dedup_by_url(records: Vec<LinkRecord>) -> Vec<LinkRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.url.clone()))
        .collect()
}

/// Final path segment of a directory URL (`.../24.04/` gives `24.04`).
#[must_use]
pub fn directory_name(url: &str) -> Option<&str> {
    let without_query = url.split(['?', '#']).next()?;
    let trimmed = without_query.strip_suffix('/')?;
    trimmed.rsplit('/').next().filter(|segment| !segment.is_empty())
}
