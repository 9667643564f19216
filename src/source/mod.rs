//! Source adapters: one per external site that publishes installer media.
//!
//! # Architecture
//!
//! - [`SourceAdapter`] - Async trait every adapter implements
//! - [`AdapterSet`] - Adapters keyed by [`AdapterId`], looked up by the executor
//! - [`OfficialSiteAdapter`] - Crawler shared by the distro adapters, driven by a [`SiteProfile`]
//! - [`WindowsAdapter`] - Microsoft download pages plus Internet Archive fallback
//! - [`DistroWatchAdapter`], [`LinuxtrackerAdapter`] - Torrent indexes
//!
//! Adapters never raise past the executor: a failed fetch is a
//! [`SourceError`] which gets logged and contributes zero records.

mod debian;
mod distrowatch;
mod error;
mod fedora;
mod http_client;
mod internet_archive;
mod linuxtracker;
mod mint;
mod official;
mod page;
mod ubuntu;
mod utils;
mod windows;

pub use debian::{DebianAdapter, DebianProfile};
pub use distrowatch::DistroWatchAdapter;
pub use error::SourceError;
pub use fedora::{FedoraAdapter, FedoraProfile};
pub use http_client::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_SOURCE_TIMEOUT, DEFAULT_TRACKER_TIMEOUT, SourceTimeouts,
};
pub use internet_archive::InternetArchiveSearch;
pub use linuxtracker::LinuxtrackerAdapter;
pub use mint::{LinuxMintAdapter, LinuxMintProfile};
pub use official::{OfficialSiteAdapter, SiteProfile};
pub use page::Anchor;
pub use ubuntu::{UbuntuAdapter, UbuntuProfile};
pub use windows::WindowsAdapter;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::dispatch::{AdapterId, AdapterTask};
use crate::record::LinkRecord;

/// A site that can turn an [`AdapterTask`] into candidate link records.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Identity the dispatcher schedules this adapter under.
    fn id(&self) -> AdapterId;

    /// Fetches candidate records for one task.
    ///
    /// Records are deduplicated by URL within this call. No version or
    /// architecture filtering happens here.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the site could not be read at all.
    async fn fetch(&self, task: &AdapterTask) -> Result<Vec<LinkRecord>, SourceError>;
}

/// Adapters available to the executor, keyed by identity.
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<AdapterId, Arc<dyn SourceAdapter>>,
}

impl AdapterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter, replacing any previous one with the same id.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.id(), adapter);
    }

    /// Builder-style [`Self::register`].
    #[must_use]
    pub fn with(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.register(adapter);
        self
    }

    #[must_use]
    pub fn get(&self, id: AdapterId) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<AdapterId> = self.adapters.keys().copied().collect();
        ids.sort();
        f.debug_struct("AdapterSet").field("adapters", &ids).finish()
    }
}

/// Builds the production adapter set.
///
/// An adapter whose HTTP client cannot be built is left out with a warning;
/// tasks scheduled for it then count as failed.
#[must_use]
pub fn build_default_adapters(source: SourceTimeouts, tracker: SourceTimeouts) -> AdapterSet {
    let mut adapters = AdapterSet::new();

    register_or_warn(
        &mut adapters,
        AdapterId::Ubuntu,
        UbuntuAdapter::new(UbuntuProfile::default(), source),
    );
    register_or_warn(
        &mut adapters,
        AdapterId::Fedora,
        FedoraAdapter::new(FedoraProfile::default(), source),
    );
    register_or_warn(
        &mut adapters,
        AdapterId::Debian,
        DebianAdapter::new(DebianProfile::default(), source),
    );
    register_or_warn(
        &mut adapters,
        AdapterId::LinuxMint,
        LinuxMintAdapter::new(LinuxMintProfile::default(), source),
    );
    register_or_warn(&mut adapters, AdapterId::Windows, WindowsAdapter::new(source));
    register_or_warn(&mut adapters, AdapterId::DistroWatch, DistroWatchAdapter::new(source));
    register_or_warn(
        &mut adapters,
        AdapterId::Linuxtracker,
        LinuxtrackerAdapter::new(tracker),
    );

    adapters
}

fn register_or_warn<A>(adapters: &mut AdapterSet, id: AdapterId, built: Result<A, SourceError>)
where
    A: SourceAdapter + 'static,
{
    match built {
        Ok(adapter) => adapters.register(Arc::new(adapter)),
        Err(error) => warn!(
            adapter = %id,
            error = %error,
            "source adapter unavailable; continuing with remaining adapters"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_default_adapters_cover_every_adapter_id() {
        let timeouts = SourceTimeouts::new(Duration::from_secs(1), Duration::from_secs(2));
        let adapters = build_default_adapters(timeouts, timeouts);
        for id in [
            AdapterId::Ubuntu,
            AdapterId::Fedora,
            AdapterId::Debian,
            AdapterId::LinuxMint,
            AdapterId::Windows,
            AdapterId::DistroWatch,
            AdapterId::Linuxtracker,
        ] {
            let adapter = adapters.get(id);
            assert!(adapter.is_some(), "{id} should be registered");
            assert_eq!(adapter.map(|a| a.id()), Some(id));
        }
        assert_eq!(adapters.len(), 7);
    }

    #[test]
    fn test_empty_adapter_set() {
        let adapters = AdapterSet::new();
        assert!(adapters.is_empty());
        assert!(adapters.get(AdapterId::Windows).is_none());
    }
}
