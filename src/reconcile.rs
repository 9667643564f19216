//! Reconciliation engine: turns raw candidates from every adapter into the
//! final answer.
//!
//! Stages run in a fixed order: version filter, architecture filter, dedup
//! by URL keeping the most trusted source, then a deterministic sort by
//! (priority, URL). Arrival order never affects the output.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use crate::record::{Architecture, LinkRecord, SourceKind, SourceRanking};

/// Filters, deduplicates and orders candidate records.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    ranking: SourceRanking,
}

impl Reconciler {
    #[must_use]
    pub fn new(ranking: SourceRanking) -> Self {
        Self { ranking }
    }

    #[must_use]
    pub fn ranking(&self) -> &SourceRanking {
        &self.ranking
    }

    /// Runs the full pipeline over `records`.
    ///
    /// Records with an empty URL are skipped. An empty result is not an error.
    #[must_use]
    #[tracing::instrument(skip(self, records), fields(candidates = records.len()))]
    pub fn reconcile(
        &self,
        records: Vec<LinkRecord>,
        version: Option<&str>,
        architecture: Option<&str>,
    ) -> Vec<LinkRecord> {
        let variants = version.map(version_variants);
        let requested_arch = architecture.map(str::to_lowercase);

        let mut by_url: HashMap<String, LinkRecord> = HashMap::new();
        for mut record in records {
            if record.url.trim().is_empty() {
                debug!("skipping record without URL");
                continue;
            }
            if let (Some(version), Some(variants)) = (version, variants.as_deref()) {
                if !matches_version(&record.url, variants) {
                    continue;
                }
                record.version_tag = Some(version.to_string());
            }
            if let Some(requested) = requested_arch.as_deref()
                && !matches_architecture(&record, requested)
            {
                continue;
            }
            self.keep_most_trusted(&mut by_url, record);
        }

        let mut kept: Vec<LinkRecord> = by_url.into_values().collect();
        kept.sort_by(|a, b| {
            self.ranking
                .priority(a.source)
                .cmp(&self.ranking.priority(b.source))
                .then_with(|| a.url.cmp(&b.url))
        });
        debug!(kept = kept.len(), "reconciliation finished");
        kept
    }

    fn keep_most_trusted(&self, by_url: &mut HashMap<String, LinkRecord>, record: LinkRecord) {
        match by_url.entry(record.url.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                let incoming_rank = self.ranking.priority(record.source);
                let current_rank = self.ranking.priority(current.source);
                let replace = incoming_rank < current_rank
                    || (incoming_rank == current_rank && tie_key(&record) < tie_key(current));
                if replace {
                    slot.insert(record);
                }
            }
        }
    }
}

/// Orders equally trusted records sharing a URL so the survivor does not
/// depend on arrival order.
fn tie_key(record: &LinkRecord) -> (Option<Architecture>, Option<&str>, Option<&str>, SourceKind) {
    (
        record.architecture,
        record.version_tag.as_deref(),
        record.title.as_deref(),
        record.source,
    )
}

/// Spellings a version takes in file names and paths (`24.04`, `24-04`,
/// `-24.04-`, `/24.04/`, `_24.04_`, `24.04_`), lower-cased.
fn version_variants(version: &str) -> Vec<String> {
    let v = version.to_lowercase();
    vec![
        v.clone(),
        v.replace('.', "-"),
        format!("-{v}-"),
        format!("/{v}/"),
        format!("_{v}_"),
        format!("{v}_"),
    ]
}

fn matches_version(url: &str, variants: &[String]) -> bool {
    let url = url.to_lowercase();
    variants.iter().any(|variant| url.contains(variant.as_str()))
}

/// A record without a declared architecture always passes.
fn matches_architecture(record: &LinkRecord, requested_lower: &str) -> bool {
    record
        .architecture
        .is_none_or(|arch| arch.as_str().contains(requested_lower))
}
