use thiserror::Error;

/// Top-level error type for the crawl/filter/scan pipeline.
///
/// Per-URL and per-probe failures are recovered locally and recorded in
/// statistics; only the variants marked fatal below abort a job.
#[derive(Error, Debug)]
pub enum SiteguardError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("HTTP error: status {status} for {url}")]
    Http { status: u16, url: String },

    /// The target domain is on the static disallowed-domain list. Fatal;
    /// distinct from network failure.
    #[error("Domain is blocked from analysis: {0}")]
    BlockedDomain(String),

    /// The seed URL could not be fetched through any request profile. Fatal.
    #[error("Seed URL unreachable through all request profiles: {url} ({last_error})")]
    BlockedOrUnreachable { url: String, last_error: String },

    /// Markup could not be parsed. Always recovered locally; a page with
    /// unparseable markup yields an empty-but-valid PageResult.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A single probe request failed. Logged and skipped, never aborts a scan.
    #[error("Probe error: {category} against {url}: {message}")]
    Probe {
        category: String,
        url: String,
        message: String,
    },

    /// Invalid configuration. Fatal.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid URL input. Fatal for a seed, recovered for discovered links.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("File error: {path} - {message}")]
    File { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Network-level failure classification for a single request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,

    #[error("connection refused or reset")]
    ConnectionRefused,

    #[error("TLS handshake or certificate failure")]
    Tls,

    #[error("server returned 403 Forbidden")]
    Forbidden,

    #[error("other transport failure: {0}")]
    Other(String),
}

impl NetworkError {
    /// Classify a reqwest transport error into the taxonomy.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::ConnectionRefused
        } else if format!("{err:?}").contains("certificate") {
            NetworkError::Tls
        } else {
            NetworkError::Other(err.to_string())
        }
    }
}

impl From<anyhow::Error> for SiteguardError {
    fn from(error: anyhow::Error) -> Self {
        SiteguardError::Unexpected(error.to_string())
    }
}

impl From<serde_json::Error> for SiteguardError {
    fn from(error: serde_json::Error) -> Self {
        SiteguardError::Serialization(error.to_string())
    }
}

pub type SiteguardResult<T> = std::result::Result<T, SiteguardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_domain_is_distinct_from_network_failure() {
        let blocked = SiteguardError::BlockedDomain("facebook.com".to_string());
        let network = SiteguardError::Network(NetworkError::ConnectionRefused);
        assert!(matches!(blocked, SiteguardError::BlockedDomain(_)));
        assert!(!matches!(network, SiteguardError::BlockedDomain(_)));
    }

    #[test]
    fn unreachable_error_names_the_url() {
        let err = SiteguardError::BlockedOrUnreachable {
            url: "https://example.com".to_string(),
            last_error: "request timed out".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://example.com"));
        assert!(msg.contains("timed out"));
    }
}
