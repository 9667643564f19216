//! Search request model.

/// One incoming search request.
///
/// Built once per search, read-only afterwards. Blank `version` and
/// `architecture` strings are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    /// Free-text query as typed; may embed the OS or distro name.
    pub text: String,
    /// Requested version (e.g. `24.04`, `vista`).
    pub version: Option<String>,
    /// Requested architecture label (e.g. `x86_64`).
    pub architecture: Option<String>,
}

impl Query {
    #[must_use]
    pub fn new(text: &str, version: Option<&str>, architecture: Option<&str>) -> Self {
        Self {
            text: text.trim().to_string(),
            version: non_blank(version),
            architecture: non_blank(architecture),
        }
    }

    /// Lower-cased query used for keyword matching only.
    #[must_use]
    pub fn lowercase(&self) -> String {
        self.text.to_lowercase()
    }

    /// Search string handed to text-matching adapters.
    ///
    /// Appends the version when the query does not already mention it.
    #[must_use]
    pub fn search_text(&self) -> String {
        match &self.version {
            Some(version) if !self.lowercase().contains(&version.to_lowercase()) => {
                format!("{} {version}", self.text)
            }
            _ => self.text.clone(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
