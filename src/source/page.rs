//! Page fetching and the small amount of markup handling adapters need.
//!
//! Adapters only ever ask two things of a page: the anchors it contains
//! (resolved to absolute URLs, with their visible text) and, for listing
//! sites, the cells of its table rows. Both are extracted with regexes,
//! which is tolerant of the broken markup third-party sites serve.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::debug;
use url::Url;

use super::SourceError;
use super::utils::compile_static_regex;

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<a\b([^>]*)>(.*?)</a\s*>"));
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?s)<[^>]*>"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"\s+"));
static TR_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?i)<tr\b[^>]*>"));
static TD_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?i)<td\b[^>]*>"));
static TABLE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)<(/?)table\b[^>]*>"));

/// A fetched HTML document.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects; the base for relative links.
    pub url: Url,
    /// Raw response body.
    pub html: String,
}

impl Page {
    /// Anchors on the whole page.
    #[must_use]
    pub fn anchors(&self) -> Vec<Anchor> {
        extract_anchors(&self.html, &self.url)
    }
}

/// An anchor target resolved against its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Absolute target URL.
    pub url: String,
    /// Visible anchor text, tags stripped and whitespace collapsed.
    pub text: String,
}

/// Fetches `url` and returns the page body.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] for unparsable URLs,
/// [`SourceError::Network`] on transport failure or timeout, and
/// [`SourceError::HttpStatus`] for non-success responses.
pub async fn fetch_page(
    client: &Client,
    source_name: &str,
    url: &str,
) -> Result<Page, SourceError> {
    let parsed = Url::parse(url).map_err(|_| SourceError::invalid_url(source_name, url))?;
    let response = client
        .get(parsed)
        .header(
            ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .send()
        .await
        .map_err(|error| SourceError::network(source_name, url, &error))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::http_status(source_name, url, status.as_u16()));
    }

    let final_url = response.url().clone();
    let html = response
        .text()
        .await
        .map_err(|error| SourceError::network(source_name, url, &error))?;
    debug!(source = source_name, url = %final_url, bytes = html.len(), "fetched page");
    Ok(Page {
        url: final_url,
        html,
    })
}

/// Extracts every anchor with an `href` from a markup fragment.
///
/// Targets that cannot be resolved, and `javascript:`/`mailto:`/fragment-only
/// links, are skipped.
#[must_use]
pub fn extract_anchors(fragment: &str, base: &Url) -> Vec<Anchor> {
    ANCHOR_RE
        .captures_iter(fragment)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let href_caps = HREF_RE.captures(attrs)?;
            let raw_href = href_caps
                .get(1)
                .or_else(|| href_caps.get(2))
                .or_else(|| href_caps.get(3))?
                .as_str();
            let href = decode_entities(raw_href.trim());
            let url = absolutize_href(&href, base)?;
            let text = text_content(caps.get(2).map_or("", |m| m.as_str()));
            Some(Anchor { url, text })
        })
        .collect()
}

/// Resolves an anchor target against its page URL.
///
/// Absolute `http(s)`, `ftp` and `magnet:` targets are kept as-is;
/// protocol-relative targets get `https:`.
#[must_use]
pub fn absolutize_href(href: &str, base: &Url) -> Option<String> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("mailto:") {
        return None;
    }
    if ["http://", "https://", "ftp://", "magnet:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return Some(href.to_string());
    }
    if href.starts_with("//") {
        return Some(format!("https:{href}"));
    }
    base.join(href).ok().map(|url| url.to_string())
}

/// Visible text of a fragment: tags stripped, entities decoded, whitespace collapsed.
#[must_use]
pub fn text_content(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WHITESPACE_RE.replace_all(decoded.trim(), " ").into_owned()
}

/// Cells of every innermost table row in a fragment, as raw markup.
///
/// Rows are delimited by `<tr>` openings, so a row that only wraps a nested
/// table yields a single cell and the nested rows are returned on their own.
#[must_use]
pub fn table_rows(fragment: &str) -> Vec<Vec<&str>> {
    element_bodies(fragment, &TR_OPEN_RE, "</tr")
        .into_iter()
        .map(|row| element_bodies(row, &TD_OPEN_RE, "</td"))
        .collect()
}

/// The table a case-insensitive `marker` belongs to, through its matching
/// `</table>`.
///
/// That is the table whose opening tag carries the marker, else the first
/// table opened after it. An unclosed table runs to the end of `html`.
#[must_use]
pub fn table_at<'a>(html: &'a str, marker: &str) -> Option<&'a str> {
    let lower = html.to_ascii_lowercase();
    let marker_at = lower.find(&marker.to_ascii_lowercase())?;
    let start = match lower[..marker_at].rfind("<table") {
        Some(open) if !lower[open..marker_at].contains('>') => open,
        _ => marker_at + lower[marker_at..].find("<table")?,
    };

    let mut depth = 0usize;
    for tag in TABLE_TAG_RE.captures_iter(&html[start..]) {
        if tag.get(1).is_some_and(|slash| !slash.is_empty()) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                let end = start + tag.get(0)?.end();
                return Some(&html[start..end]);
            }
        } else {
            depth += 1;
        }
    }
    Some(&html[start..])
}

/// Bodies of elements opened by `open`, each cut at `close` or the next opening.
fn element_bodies<'a>(fragment: &'a str, open: &Regex, close: &str) -> Vec<&'a str> {
    let lower = fragment.to_ascii_lowercase();
    let openings: Vec<(usize, usize)> = open
        .find_iter(fragment)
        .map(|m| (m.start(), m.end()))
        .collect();

    openings
        .iter()
        .enumerate()
        .map(|(index, (_, body_start))| {
            let limit = openings
                .get(index + 1)
                .map_or(fragment.len(), |(next_start, _)| *next_start);
            let body_end = lower[*body_start..limit]
                .find(close)
                .map_or(limit, |offset| body_start + offset);
            &fragment[*body_start..body_end]
        })
        .collect()
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://releases.ubuntu.com/24.04/").unwrap()
    }

    #[test]
    fn test_extract_anchors_resolves_relative_targets() {
        let html = r#"<p><a href="ubuntu-24.04-desktop-amd64.iso">Desktop <b>image</b></a>
            <a class="x" href='/noble/'>Noble</a></p>"#;
        let anchors = extract_anchors(html, &base());
        assert_eq!(anchors.len(), 2);
        assert_eq!(
            anchors[0].url,
            "https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso"
        );
        assert_eq!(anchors[0].text, "Desktop image");
        assert_eq!(anchors[1].url, "https://releases.ubuntu.com/noble/");
    }

    #[test]
    fn test_extract_anchors_skips_non_navigational_targets() {
        let html = r##"<a href="#top">Top</a><a href="mailto:x@y">Mail</a>
            <a href="javascript:void(0)">JS</a><a name="anchor">No href</a>"##;
        assert!(extract_anchors(html, &base()).is_empty());
    }

    #[test]
    fn test_extract_anchors_decodes_entities_in_href() {
        let html = r#"<a href="/index.php?page=torrent&amp;id=7">t</a>"#;
        let anchors = extract_anchors(html, &Url::parse("https://linuxtracker.org/").unwrap());
        assert_eq!(anchors[0].url, "https://linuxtracker.org/index.php?page=torrent&id=7");
    }

    #[test]
    fn test_absolutize_keeps_magnet_and_protocol_relative() {
        assert_eq!(
            absolutize_href("magnet:?xt=urn:btih:abc", &base()).as_deref(),
            Some("magnet:?xt=urn:btih:abc")
        );
        assert_eq!(
            absolutize_href("//cdimage.debian.org/x.iso", &base()).as_deref(),
            Some("https://cdimage.debian.org/x.iso")
        );
    }

    #[test]
    fn test_text_content_collapses_markup() {
        assert_eq!(
            text_content("  <b>Ubuntu</b>\n 24.04&nbsp;LTS &amp; more "),
            "Ubuntu 24.04 LTS & more"
        );
    }

    #[test]
    fn test_table_rows_splits_nested_tables() {
        let html = "<table><tr><td class=\"News1\"><table>\
            <tr><td>Ubuntu 24.04</td><td><a href=\"a.torrent\">t</a></td></tr>\
            <tr><td>Fedora 40</td><td>x</td></tr>\
            </table></td></tr></table>";
        let rows = table_rows(html);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[1].len(), 2);
        assert_eq!(text_content(rows[1][0]), "Ubuntu 24.04");
        assert_eq!(text_content(rows[2][0]), "Fedora 40");
    }

    #[test]
    fn test_table_at_marker_in_opening_tag_stops_at_matching_close() {
        let html = "<div>head</div><TABLE CLASS=\"lista\"><tr><td><table><tr><td>inner</td></tr></table></td></tr></TABLE>\
            <table><tr><td>sidebar</td></tr></table>";
        let table = table_at(html, "class=\"lista\"").unwrap();
        assert!(table.starts_with("<TABLE CLASS"));
        assert!(table.ends_with("</TABLE>"));
        assert!(table.contains("inner"));
        assert!(!table.contains("sidebar"));
    }

    #[test]
    fn test_table_at_marker_in_cell_takes_following_table() {
        let html = "<table><tr><td class=\"News1\"><table><tr><td>listing</td></tr></table></td></tr></table>\
            <table><tr><td>ad</td></tr></table>";
        let table = table_at(html, "News1").unwrap();
        assert_eq!(table, "<table><tr><td>listing</td></tr></table>");
    }

    #[test]
    fn test_table_at_missing_marker_or_table() {
        assert!(table_at("<table></table>", "News1").is_none());
        assert!(table_at("<td class=\"News1\">no table</td>", "News1").is_none());
        assert_eq!(
            table_at("<table class=\"lista\"><tr><td>cut", "class=\"lista\""),
            Some("<table class=\"lista\"><tr><td>cut")
        );
    }
}
