//! Aggregation tests over stub adapters (no network).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use iso_search_core::{
    AdapterId, AdapterSet, AdapterTask, Aggregator, Architecture, Dispatcher, LinkRecord,
    Reconciler, SourceAdapter, SourceError, SourceKind, SourceTimeouts, UNRANKED_PRIORITY,
};
use iso_search_core::source::DistroWatchAdapter;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Returns a fixed record list and counts how often it was called.
struct FixedAdapter {
    id: AdapterId,
    records: Vec<LinkRecord>,
    calls: Arc<AtomicUsize>,
}

impl FixedAdapter {
    fn new(id: AdapterId, records: Vec<LinkRecord>) -> Self {
        Self {
            id,
            records,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl SourceAdapter for FixedAdapter {
    fn id(&self) -> AdapterId {
        self.id
    }

    async fn fetch(&self, _task: &AdapterTask) -> Result<Vec<LinkRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

struct PanickingAdapter(AdapterId);

#[async_trait]
impl SourceAdapter for PanickingAdapter {
    fn id(&self) -> AdapterId {
        self.0
    }

    async fn fetch(&self, _task: &AdapterTask) -> Result<Vec<LinkRecord>, SourceError> {
        panic!("unexpected page layout");
    }
}

struct FailingAdapter(AdapterId);

#[async_trait]
impl SourceAdapter for FailingAdapter {
    fn id(&self) -> AdapterId {
        self.0
    }

    async fn fetch(&self, _task: &AdapterTask) -> Result<Vec<LinkRecord>, SourceError> {
        Err(SourceError::http_status(
            self.0.name(),
            "https://example.invalid/",
            503,
        ))
    }
}

fn aggregator(adapters: AdapterSet) -> Aggregator {
    Aggregator::with_parts(adapters, Dispatcher::default(), Reconciler::default())
}

fn official(url: &str) -> LinkRecord {
    LinkRecord::from_url(url, SourceKind::Official)
}

fn torrent(url: &str, source: SourceKind) -> LinkRecord {
    LinkRecord::new(url, source)
}

fn mixed_adapters() -> AdapterSet {
    AdapterSet::new()
        .with(Arc::new(FixedAdapter::new(
            AdapterId::Ubuntu,
            vec![
                official("https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso"),
                official("https://releases.ubuntu.com/24.04/ubuntu-24.04-live-server-amd64.iso"),
                official("https://cdimage.ubuntu.com/releases/24.04/ubuntu-24.04-server-arm64.iso"),
            ],
        )))
        .with(Arc::new(FixedAdapter::new(
            AdapterId::DistroWatch,
            vec![
                torrent(
                    "https://distrowatch.com/dwres/torrents/ubuntu-24.04-desktop-amd64.iso.torrent",
                    SourceKind::DistroWatch,
                ),
                LinkRecord::new(
                    "https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso",
                    SourceKind::DistroWatch,
                ),
            ],
        )))
        .with(Arc::new(FixedAdapter::new(
            AdapterId::Linuxtracker,
            vec![
                torrent(
                    "https://linuxtracker.org/download.php?id=abc&f=ubuntu-24.04.torrent",
                    SourceKind::Linuxtracker,
                ),
                torrent(
                    "https://distrowatch.com/dwres/torrents/ubuntu-24.04-desktop-amd64.iso.torrent",
                    SourceKind::Linuxtracker,
                ),
            ],
        )))
}

#[tokio::test]
async fn test_unrecognized_query_calls_no_adapter() {
    let stub = Arc::new(FixedAdapter::new(
        AdapterId::Ubuntu,
        vec![official("https://x/ubuntu.iso")],
    ));
    let calls = Arc::clone(&stub.calls);
    let agg = aggregator(AdapterSet::new().with(stub));

    for query in ["FreeBSD 14", "haiku", "macOS Sonoma", ""] {
        assert!(agg.aggregate(query, None, None).await.is_empty());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ubuntu_example_official_sorted_first() {
    let adapters = AdapterSet::new()
        .with(Arc::new(FixedAdapter::new(
            AdapterId::Ubuntu,
            vec![official(
                "https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso",
            )],
        )))
        .with(Arc::new(FixedAdapter::new(
            AdapterId::DistroWatch,
            vec![torrent(
                "https://distrowatch.com/dwres/torrents/ubuntu-24.04-desktop-amd64.iso.torrent",
                SourceKind::DistroWatch,
            )],
        )))
        .with(Arc::new(FixedAdapter::new(AdapterId::Linuxtracker, Vec::new())));

    let links = aggregator(adapters).aggregate("Ubuntu 24.04", None, None).await;

    let summary: Vec<(&str, SourceKind)> =
        links.iter().map(|r| (r.url.as_str(), r.source)).collect();
    assert_eq!(
        summary,
        vec![
            (
                "https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso",
                SourceKind::Official
            ),
            (
                "https://distrowatch.com/dwres/torrents/ubuntu-24.04-desktop-amd64.iso.torrent",
                SourceKind::DistroWatch
            ),
        ]
    );
}

#[tokio::test]
async fn test_urls_unique_and_most_trusted_source_kept() {
    let links = aggregator(mixed_adapters())
        .aggregate("ubuntu 24.04", None, None)
        .await;

    let mut urls: Vec<&str> = links.iter().map(|r| r.url.as_str()).collect();
    let total = urls.len();
    urls.sort_unstable();
    urls.dedup();
    assert_eq!(urls.len(), total);
    assert_eq!(total, 5);

    let desktop = links
        .iter()
        .find(|r| r.url == "https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso")
        .unwrap();
    assert_eq!(desktop.source, SourceKind::Official);

    let shared_torrent = links
        .iter()
        .find(|r| r.url.starts_with("https://distrowatch.com/"))
        .unwrap();
    assert_eq!(shared_torrent.source, SourceKind::DistroWatch);
}

#[tokio::test]
async fn test_output_sorted_by_priority_then_url() {
    let agg = aggregator(mixed_adapters());
    let links = agg.aggregate("ubuntu", None, None).await;
    assert!(links.len() >= 2);

    let mut resorted = links.clone();
    resorted.sort_by(|a, b| {
        let pa = Reconciler::default().ranking().priority(a.source);
        let pb = Reconciler::default().ranking().priority(b.source);
        pa.cmp(&pb).then_with(|| a.url.cmp(&b.url))
    });
    assert_eq!(resorted, links);
    let ranking = Reconciler::default();
    assert!(
        links
            .iter()
            .all(|r| ranking.ranking().priority(r.source) < UNRANKED_PRIORITY)
    );
}

#[tokio::test]
async fn test_repeated_searches_are_identical() {
    let agg = aggregator(mixed_adapters());
    let first = agg.aggregate("Ubuntu", Some("24.04"), Some("x86_64")).await;
    let second = agg.aggregate("Ubuntu", Some("24.04"), Some("x86_64")).await;
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert!(!first.is_empty());
}

#[tokio::test]
async fn test_version_filter_end_to_end() {
    let adapters = AdapterSet::new().with(Arc::new(FixedAdapter::new(
        AdapterId::Ubuntu,
        vec![
            official("https://old-releases.ubuntu.com/product-12.04-desktop-i386.iso"),
            official("https://old-releases.ubuntu.com/product-13.10-desktop-i386.iso"),
        ],
    )));
    let links = aggregator(adapters)
        .aggregate("ubuntu", Some("12.04"), None)
        .await;
    assert_eq!(links.len(), 1);
    assert!(links[0].url.contains("12.04"));
    assert_eq!(links[0].version_tag.as_deref(), Some("12.04"));
}

#[tokio::test]
async fn test_architecture_filter_spares_unlabeled_records() {
    let adapters = AdapterSet::new()
        .with(Arc::new(FixedAdapter::new(
            AdapterId::Debian,
            vec![LinkRecord::new("https://cdimage.debian.org/debian-12.iso", SourceKind::Official)
                .with_architecture(Some(Architecture::X86_64))],
        )))
        .with(Arc::new(FixedAdapter::new(
            AdapterId::DistroWatch,
            vec![torrent(
                "https://distrowatch.com/dwres/torrents/debian-12.torrent",
                SourceKind::DistroWatch,
            )],
        )));
    let links = aggregator(adapters)
        .aggregate("debian 12", None, Some("i386"))
        .await;
    assert_eq!(links.len(), 1);
    assert_eq!(
        links[0].url,
        "https://distrowatch.com/dwres/torrents/debian-12.torrent"
    );
}

#[tokio::test]
async fn test_panicking_adapter_does_not_affect_others() {
    let adapters = AdapterSet::new()
        .with(Arc::new(PanickingAdapter(AdapterId::Fedora)))
        .with(Arc::new(FixedAdapter::new(
            AdapterId::DistroWatch,
            vec![
                torrent("https://distrowatch.com/a/fedora-40-a.torrent", SourceKind::DistroWatch),
                torrent("https://distrowatch.com/a/fedora-40-b.torrent", SourceKind::DistroWatch),
            ],
        )))
        .with(Arc::new(FailingAdapter(AdapterId::Linuxtracker)));

    let agg = aggregator(adapters);
    let outcome = agg
        .search(&iso_search_core::Query::new("fedora 40", None, None))
        .await;

    assert_eq!(outcome.dispatched, 3);
    assert_eq!(outcome.failed, 2);
    let urls: Vec<&str> = outcome.records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://distrowatch.com/a/fedora-40-a.torrent",
            "https://distrowatch.com/a/fedora-40-b.torrent"
        ]
    );
}

#[tokio::test]
async fn test_windows_query_reaches_windows_adapter_only() {
    let windows = Arc::new(FixedAdapter::new(
        AdapterId::Windows,
        vec![
            LinkRecord::new("https://archive.org/details/win7-ultimate-x64", SourceKind::InternetArchive)
                .with_title("Windows 7 Ultimate x64"),
        ],
    ));
    let ubuntu = Arc::new(FixedAdapter::new(AdapterId::Ubuntu, Vec::new()));
    let windows_calls = Arc::clone(&windows.calls);
    let ubuntu_calls = Arc::clone(&ubuntu.calls);

    let agg = aggregator(AdapterSet::new().with(windows).with(ubuntu));
    let links = agg.aggregate("Windows 7", Some("7"), None).await;

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].source, SourceKind::InternetArchive);
    // legacy release without architecture fans out to one task per architecture
    assert_eq!(windows_calls.load(Ordering::SeqCst), 2);
    assert_eq!(ubuntu_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_timed_out_source_contributes_nothing_and_blocks_no_one() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    let slow = DistroWatchAdapter::with_base_url(
        &server.uri(),
        SourceTimeouts::new(Duration::from_secs(1), Duration::from_secs(1)),
    )
    .unwrap();

    let adapters = AdapterSet::new()
        .with(Arc::new(slow))
        .with(Arc::new(FixedAdapter::new(
            AdapterId::Ubuntu,
            vec![official(
                "https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso",
            )],
        )));
    let agg = Aggregator::with_parts(
        adapters,
        Dispatcher::new(vec![AdapterId::DistroWatch]),
        Reconciler::default(),
    );

    let started = Instant::now();
    let outcome = agg
        .search(&iso_search_core::Query::new("ubuntu 24.04", None, None))
        .await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(outcome.dispatched, 2);
    assert_eq!(outcome.failed, 1);
    let urls: Vec<&str> = outcome.records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://releases.ubuntu.com/24.04/ubuntu-24.04-desktop-amd64.iso"]
    );
}
