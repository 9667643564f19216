//! Shared User-Agent strings for source HTTP clients.
//!
//! Single place for the UA format so traffic to every source identifies the
//! tool the same way.

/// Browser User-Agent for vendor pages that serve reduced markup to bots.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Safari/605.1.15";

/// Default User-Agent for source requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_source_user_agent() -> String {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    format!("{name}/{version} (installer-media-index)")
}
