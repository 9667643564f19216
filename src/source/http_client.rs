//! Shared HTTP client construction policy for source adapters.
//!
//! Every adapter builds its client here so timeout, user-agent, compression
//! and proxy handling stay consistent. Timeouts are passed in explicitly;
//! there is no process-wide timeout state.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use super::SourceError;

/// Default connect timeout for every source.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default whole-request timeout for official sites and catalog sources.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(15);

/// Default whole-request timeout for torrent trackers, which tend to be slower.
pub const DEFAULT_TRACKER_TIMEOUT: Duration = Duration::from_secs(20);

/// Timeouts applied to one adapter's HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTimeouts {
    /// TCP/TLS connect timeout.
    pub connect: Duration,
    /// Whole-request timeout, covering headers and body.
    pub request: Duration,
}

impl SourceTimeouts {
    #[must_use]
    pub fn new(connect: Duration, request: Duration) -> Self {
        Self { connect, request }
    }
}

impl Default for SourceTimeouts {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_SOURCE_TIMEOUT)
    }
}

/// Proxy variables consulted for `https` targets, in order.
const HTTPS_PROXY_VARS: [&str; 4] = ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"];

/// Proxy variables consulted for `http` targets, in order.
const HTTP_PROXY_VARS: [&str; 4] = ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"];

/// Builds a source HTTP client using shared project policy.
///
/// `source_name` is used only for error messages and logging.
///
/// # Errors
///
/// Returns [`SourceError::ClientBuild`] when client construction fails.
pub fn build_source_http_client(
    source_name: &str,
    user_agent: &str,
    timeouts: SourceTimeouts,
) -> Result<Client, SourceError> {
    let built = match build_guarded(user_agent, timeouts, ProxyLookup::System) {
        Err(ClientBuildError::Panicked) => {
            // System proxy discovery panics in some sandboxes; proxy
            // variables from the environment still apply.
            warn!(
                source = source_name,
                "system proxy lookup panicked; using proxy environment variables only"
            );
            build_guarded(user_agent, timeouts, ProxyLookup::EnvironmentOnly)
        }
        other => other,
    };

    built.map_err(|failure| match failure {
        ClientBuildError::Panicked => SourceError::client_build(
            source_name,
            "HTTP client construction panicked while initializing networking",
        ),
        ClientBuildError::Reqwest(error) => {
            SourceError::client_build(source_name, &error.to_string())
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProxyLookup {
    System,
    EnvironmentOnly,
}

enum ClientBuildError {
    Panicked,
    Reqwest(reqwest::Error),
}

/// Builds a client, turning a panic inside reqwest into an error.
fn build_guarded(
    user_agent: &str,
    timeouts: SourceTimeouts,
    proxies: ProxyLookup,
) -> Result<Client, ClientBuildError> {
    let user_agent = user_agent.to_string();
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(user_agent, timeouts);
        if proxies == ProxyLookup::EnvironmentOnly {
            builder = with_env_proxies(builder.no_proxy());
        }
        builder.build().map_err(ClientBuildError::Reqwest)
    }))
    .map_err(|_| ClientBuildError::Panicked)?
}

fn base_builder(user_agent: String, timeouts: SourceTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .user_agent(user_agent)
        .gzip(true)
}

fn with_env_proxies(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = first_env_value(&HTTPS_PROXY_VARS).and_then(|v| Proxy::https(&v).ok()) {
        builder = builder.proxy(proxy);
    }
    if let Some(proxy) = first_env_value(&HTTP_PROXY_VARS).and_then(|v| Proxy::http(&v).ok()) {
        builder = builder.proxy(proxy);
    }
    builder
}

/// First non-blank value among the named environment variables.
fn first_env_value(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
