//! Aggregation entry point wiring dispatch, execution and reconciliation.
//!
//! # Example
//!
//! ```no_run
//! use iso_search_core::aggregate;
//!
//! # async fn example() {
//! let links = aggregate("Ubuntu 24.04", None, Some("x86_64")).await;
//! for link in links {
//!     println!("[{}] {}", link.source, link.url);
//! }
//! # }
//! ```

use std::time::Duration;

use tracing::info;

use crate::dispatch::{AdapterId, Dispatcher};
use crate::executor::execute;
use crate::query::Query;
use crate::reconcile::Reconciler;
use crate::record::{LinkRecord, SourceRanking};
use crate::source::{
    AdapterSet, DEFAULT_CONNECT_TIMEOUT, DEFAULT_SOURCE_TIMEOUT, DEFAULT_TRACKER_TIMEOUT,
    SourceTimeouts, build_default_adapters,
};

/// Runtime settings for an [`Aggregator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Connect timeout shared by every source.
    pub connect_timeout: Duration,
    /// Request timeout for official sites, DistroWatch and Internet Archive.
    pub source_timeout: Duration,
    /// Request timeout for Linuxtracker.
    pub tracker_timeout: Duration,
    /// Torrent indexes scheduled alongside official distro adapters, in order.
    pub torrent_indexes: Vec<AdapterId>,
    /// Trust order used to resolve URL conflicts and sort output.
    pub ranking: SourceRanking,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            tracker_timeout: DEFAULT_TRACKER_TIMEOUT,
            torrent_indexes: vec![AdapterId::DistroWatch, AdapterId::Linuxtracker],
            ranking: SourceRanking::default(),
        }
    }
}

impl AggregatorConfig {
    fn source_timeouts(&self) -> SourceTimeouts {
        SourceTimeouts::new(self.connect_timeout, self.source_timeout)
    }

    fn tracker_timeouts(&self) -> SourceTimeouts {
        SourceTimeouts::new(self.connect_timeout, self.tracker_timeout)
    }
}

/// What one search produced, plus how many adapters took part.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Final ranked, deduplicated records.
    pub records: Vec<LinkRecord>,
    /// Adapter tasks the dispatcher scheduled.
    pub dispatched: usize,
    /// Tasks that failed and contributed nothing.
    pub failed: usize,
}

/// Multi-source installer media search.
#[derive(Debug, Clone)]
pub struct Aggregator {
    adapters: AdapterSet,
    dispatcher: Dispatcher,
    reconciler: Reconciler,
}

impl Aggregator {
    /// Builds an aggregator over the production adapters.
    #[must_use]
    pub fn new(config: &AggregatorConfig) -> Self {
        Self::with_parts(
            build_default_adapters(config.source_timeouts(), config.tracker_timeouts()),
            Dispatcher::new(config.torrent_indexes.clone()),
            Reconciler::new(config.ranking.clone()),
        )
    }

    /// Builds an aggregator from explicit parts (tests use stub adapters here).
    #[must_use]
    pub fn with_parts(
        adapters: AdapterSet,
        dispatcher: Dispatcher,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            adapters,
            dispatcher,
            reconciler,
        }
    }

    /// Returns ranked, deduplicated links for a query.
    ///
    /// Never fails; unreachable sources simply contribute nothing.
    pub async fn aggregate(
        &self,
        query: &str,
        version: Option<&str>,
        architecture: Option<&str>,
    ) -> Vec<LinkRecord> {
        self.search(&Query::new(query, version, architecture))
            .await
            .records
    }

    /// Like [`Self::aggregate`], also reporting how many sources took part.
    #[tracing::instrument(
        skip(self, query),
        fields(query = %query.text, version = ?query.version, architecture = ?query.architecture)
    )]
    pub async fn search(&self, query: &Query) -> SearchOutcome {
        let tasks = self.dispatcher.dispatch(query);
        let dispatched = tasks.len();
        if dispatched == 0 {
            return SearchOutcome::default();
        }

        let report = execute(&self.adapters, tasks).await;
        let records = self.reconciler.reconcile(
            report.records,
            query.version.as_deref(),
            query.architecture.as_deref(),
        );
        info!(
            dispatched,
            failed = report.failed,
            links = records.len(),
            "search finished"
        );
        SearchOutcome {
            records,
            dispatched,
            failed: report.failed,
        }
    }
}

/// Searches every matching source with default settings.
pub async fn aggregate(
    query: &str,
    version: Option<&str>,
    architecture: Option<&str>,
) -> Vec<LinkRecord> {
    Aggregator::new(&AggregatorConfig::default())
        .aggregate(query, version, architecture)
        .await
}
