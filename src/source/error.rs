//! Error types for source adapter operations.
//!
//! Every variant names the source it came from so the executor can log
//! failures without extra context. None of these errors ever reach the
//! caller of `aggregate`.

use thiserror::Error;

/// Errors that can occur while fetching or parsing one source.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Transport failure or timeout
    #[error("request to {url} failed for source '{source_name}': {reason}")]
    Network {
        /// Adapter name
        source_name: String,
        /// URL being fetched
        url: String,
        /// Underlying transport error
        reason: String,
    },

    /// Non-success HTTP status
    #[error("{url} returned HTTP {status} for source '{source_name}'")]
    HttpStatus {
        /// Adapter name
        source_name: String,
        /// URL being fetched
        url: String,
        /// Status code received
        status: u16,
    },

    /// Page or payload did not have the expected shape
    #[error("unexpected response from source '{source_name}' at {url}: {reason}")]
    UnexpectedMarkup {
        /// Adapter name
        source_name: String,
        /// URL that was parsed
        url: String,
        /// What was missing or malformed
        reason: String,
    },

    /// A configured endpoint is not a valid URL
    #[error("invalid URL '{url}' configured for source '{source_name}'")]
    InvalidUrl {
        /// Adapter name
        source_name: String,
        /// Offending URL
        url: String,
    },

    /// HTTP client construction failed
    #[error("HTTP client for source '{source_name}' could not be built: {reason}")]
    ClientBuild {
        /// Adapter name
        source_name: String,
        /// Why construction failed
        reason: String,
    },
}

impl SourceError {
    /// Creates a `Network` error from a transport failure.
    #[must_use]
    pub fn network(source_name: &str, url: &str, error: &reqwest::Error) -> Self {
        let reason = if error.is_timeout() {
            format!("timed out: {error}")
        } else {
            error.to_string()
        };
        Self::Network {
            source_name: source_name.to_string(),
            url: url.to_string(),
            reason,
        }
    }

    /// Creates an `HttpStatus` error.
    #[must_use]
    pub fn http_status(source_name: &str, url: &str, status: u16) -> Self {
        Self::HttpStatus {
            source_name: source_name.to_string(),
            url: url.to_string(),
            status,
        }
    }

    /// Creates an `UnexpectedMarkup` error.
    #[must_use]
    pub fn unexpected_markup(source_name: &str, url: &str, reason: &str) -> Self {
        Self::UnexpectedMarkup {
            source_name: source_name.to_string(),
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an `InvalidUrl` error.
    #[must_use]
    pub fn invalid_url(source_name: &str, url: &str) -> Self {
        Self::InvalidUrl {
            source_name: source_name.to_string(),
            url: url.to_string(),
        }
    }

    /// Creates a `ClientBuild` error.
    #[must_use]
    pub fn client_build(source_name: &str, reason: &str) -> Self {
        Self::ClientBuild {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message() {
        let err = SourceError::http_status("distrowatch", "https://distrowatch.com/x", 503);
        let msg = err.to_string();
        assert!(msg.contains("503"), "should contain status");
        assert!(msg.contains("distrowatch"), "should name the source");
    }

    #[test]
    fn test_unexpected_markup_message() {
        let err = SourceError::unexpected_markup(
            "linuxtracker",
            "https://linuxtracker.org/index.php",
            "torrent table missing",
        );
        let msg = err.to_string();
        assert!(msg.contains("torrent table missing"), "should contain reason");
        assert!(msg.contains("linuxtracker.org"), "should contain url");
    }

    #[test]
    fn test_invalid_url_message() {
        let err = SourceError::invalid_url("ubuntu", "not a url");
        assert!(err.to_string().contains("not a url"));
    }
}
