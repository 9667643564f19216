//! Result rendering for stdout.

use anyhow::{Context, Result};
use iso_search_core::LinkRecord;

/// One line per link: `[source] link (architecture, version) title`.
///
/// The parenthesized part lists only the fields that are known and is
/// omitted when neither is.
#[must_use]
pub fn render_text(records: &[LinkRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format!("[{}] {}", record.source, record.url));

        let details: Vec<&str> = [
            record.architecture.map(|arch| arch.as_str()),
            record.version_tag.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !details.is_empty() {
            out.push_str(&format!(" ({})", details.join(", ")));
        }
        if let Some(title) = record.title.as_deref() {
            out.push(' ');
            out.push_str(title);
        }
        out.push('\n');
    }
    out
}

/// Pretty-printed JSON array of boundary objects.
pub fn render_json(records: &[LinkRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize results as JSON")
}

#[cfg(test)]
mod tests {
    use iso_search_core::{Architecture, SourceKind};

    use super::*;

    fn sample() -> Vec<LinkRecord> {
        vec![
            LinkRecord::new(
                "https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso",
                SourceKind::Official,
            )
            .with_architecture(Some(Architecture::X86_64)),
            LinkRecord::new(
                "https://archive.org/details/win-vista",
                SourceKind::InternetArchive,
            )
            .with_title("Windows Vista Ultimate"),
        ]
    }

    #[test]
    fn test_render_text_lists_known_details_only() {
        let mut records = sample();
        records[0].version_tag = Some("24.04".to_string());
        let text = render_text(&records);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[Official] https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso (x86_64, 24.04)",
                "[Internet Archive] https://archive.org/details/win-vista Windows Vista Ultimate",
            ]
        );
    }

    #[test]
    fn test_render_text_empty() {
        assert!(render_text(&[]).is_empty());
    }

    #[test]
    fn test_render_json_uses_boundary_field_names() {
        let json = render_json(&sample()).expect("serializable");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
        let items = value.as_array().expect("array");
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0]["link"],
            "https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso"
        );
        assert_eq!(items[0]["source"], "Official");
        assert_eq!(items[0]["architecture"], "x86_64");
        assert!(items[0].get("title").is_none());
        assert_eq!(items[1]["title"], "Windows Vista Ultimate");
    }

    #[test]
    fn test_render_json_empty_array() {
        assert_eq!(render_json(&[]).expect("serializable"), "[]");
    }
}
