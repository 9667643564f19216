//! ISO Search Core Library
//!
//! Aggregates installer-media download links for Linux distributions and
//! Windows from official vendor sites, torrent indexes and the Internet
//! Archive, then filters, deduplicates and ranks them.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`dispatch`] - Maps a query to the source adapters that should see it
//! - [`source`] - One adapter per external site, behind the [`SourceAdapter`] trait
//! - [`executor`] - Runs a request's adapter tasks concurrently
//! - [`reconcile`] - Version/architecture filters, priority dedup, stable sort
//! - [`aggregator`] - Wires the stages together behind [`aggregate`]
//! - [`record`] - [`LinkRecord`] and the source trust ranking
//!
//! The library only emits `tracing` events and spans; installing a
//! subscriber is left to the binary.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod dispatch;
pub mod executor;
pub mod query;
pub mod reconcile;
pub mod record;
pub mod source;
mod user_agent;

// Re-export commonly used types
pub use aggregator::{Aggregator, AggregatorConfig, SearchOutcome, aggregate};
pub use dispatch::{AdapterId, AdapterTask, Dispatcher, Distro};
pub use executor::{ExecutionReport, execute};
pub use query::Query;
pub use reconcile::Reconciler;
pub use record::{Architecture, LinkRecord, SourceKind, SourceRanking, UNRANKED_PRIORITY};
pub use source::{AdapterSet, SourceAdapter, SourceError, SourceTimeouts, build_default_adapters};
