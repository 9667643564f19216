//! Internet Archive catalog search for Windows installer images.
//!
//! Used by the Windows adapter as the only source for releases Microsoft no
//! longer serves. Results point at catalog detail pages, not files.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::record::{Architecture, LinkRecord, SourceKind};

use super::SourceError;

/// Default Internet Archive base URL.
const DEFAULT_BASE_URL: &str = "https://archive.org";

const SOURCE_NAME: &str = "internet-archive";

/// Rows requested from the catalog per search.
const MAX_ROWS: &str = "100";

const X86_64_PHRASE: &str = " 64-bit OR 64bit OR x64 OR amd64";
const I386_PHRASE: &str = " 32-bit OR 32bit OR x86";

const TITLE_64_BIT_MARKERS: [&str; 4] = ["64", "x64", "amd64", "x86_64"];
const TITLE_32_BIT_MARKERS: [&str; 3] = ["32", "x86", "i386"];

// ==================== Catalog Response Types ====================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    docs: Vec<CatalogItem>,
}

#[derive(Debug, Deserialize)]
struct CatalogItem {
    identifier: String,
    title: Option<TitleField>,
}

/// The catalog returns `title` as a string or, for some items, a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TitleField {
    One(String),
    Many(Vec<String>),
}

impl TitleField {
    fn into_text(self) -> Option<String> {
        match self {
            Self::One(title) => Some(title),
            Self::Many(titles) => titles.into_iter().next(),
        }
    }
}

/// Catalog search against archive.org's advanced search API.
#[derive(Debug, Clone)]
pub struct InternetArchiveSearch {
    client: Client,
    base_url: String,
}

impl InternetArchiveSearch {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Searches the catalog for Windows `version` images.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the catalog cannot be reached or its
    /// response is not the expected JSON shape.
    #[tracing::instrument(skip(self), fields(source = SOURCE_NAME))]
    pub async fn search(
        &self,
        version: Option<&str>,
        architecture: Option<Architecture>,
    ) -> Result<Vec<LinkRecord>, SourceError> {
        let search_url = self.search_url(&search_phrase(version, architecture))?;
        let response = self
            .client
            .get(search_url.clone())
            .send()
            .await
            .map_err(|error| SourceError::network(SOURCE_NAME, search_url.as_str(), &error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::http_status(
                SOURCE_NAME,
                search_url.as_str(),
                status.as_u16(),
            ));
        }

        let body = response.json::<SearchResponse>().await.map_err(|error| {
            SourceError::unexpected_markup(SOURCE_NAME, search_url.as_str(), &error.to_string())
        })?;
        debug!(items = body.response.docs.len(), "catalog search returned items");

        let records = body
            .response
            .docs
            .into_iter()
            .filter_map(|item| {
                let title = item.title.and_then(TitleField::into_text)?;
                let title_lower = title.to_lowercase();
                if !title_lower.contains("windows")
                    || !title_matches_version(&title_lower, version)
                    || !title_matches_architecture(&title_lower, architecture)
                {
                    return None;
                }
                let arch = Architecture::infer_from_text(&title_lower).or(architecture);
                Some(
                    LinkRecord::new(
                        format!("{}/details/{}", self.base_url, item.identifier),
                        SourceKind::InternetArchive,
                    )
                    .with_architecture(arch)
                    .with_title(title),
                )
            })
            .collect();
        Ok(records)
    }

    fn search_url(&self, phrase: &str) -> Result<Url, SourceError> {
        let endpoint = format!("{}/advancedsearch.php", self.base_url);
        let mut url =
            Url::parse(&endpoint).map_err(|_| SourceError::invalid_url(SOURCE_NAME, &endpoint))?;
        url.query_pairs_mut()
            .append_pair("q", phrase)
            .append_pair("fl[]", "identifier")
            .append_pair("fl[]", "title")
            .append_pair("rows", MAX_ROWS)
            .append_pair("output", "json");
        Ok(url)
    }
}

/// Catalog phrase for a version, with architecture wording appended.
fn search_phrase(version: Option<&str>, architecture: Option<Architecture>) -> String {
    let mut phrase = match version.map(str::to_lowercase).as_deref() {
        Some("vista") => "Windows Vista ISO".to_string(),
        Some(v) => format!("Windows {v} ISO"),
        None => "Windows ISO".to_string(),
    };
    match architecture {
        Some(Architecture::X86_64) => phrase.push_str(X86_64_PHRASE),
        Some(Architecture::I386) => phrase.push_str(I386_PHRASE),
        _ => {}
    }
    phrase
}

fn title_matches_version(title_lower: &str, version: Option<&str>) -> bool {
    let Some(version) = version.map(str::to_lowercase) else {
        return true;
    };
    match version.as_str() {
        // "windows 8" is a prefix of "windows 8.1"
        "8" => title_lower.contains("windows 8") && !title_lower.contains("8.1"),
        v => {
            title_lower.contains(&format!("windows {v}"))
                || title_lower.contains(&format!("windows{v}"))
        }
    }
}

/// 64-bit requests need a 64-bit marker in the title. 32-bit requests reject
/// only titles that name 64-bit and nothing 32-bit.
fn title_matches_architecture(title_lower: &str, architecture: Option<Architecture>) -> bool {
    let has_64 = TITLE_64_BIT_MARKERS.iter().any(|m| title_lower.contains(m));
    let has_32 = TITLE_32_BIT_MARKERS.iter().any(|m| title_lower.contains(m));
    match architecture {
        Some(Architecture::X86_64) => has_64,
        Some(Architecture::I386) => has_32 || !has_64,
        _ => true,
    }
}
