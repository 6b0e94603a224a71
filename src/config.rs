// src/config.rs
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::error::{SiteguardError, SiteguardResult};
use crate::report::FindingCategory;

/// Parameters for a single crawl job. Immutable once a crawl starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTarget {
    pub seed_url: String,
    pub max_depth: usize,
    pub max_pages: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Minimum spacing between fetches to the same host, in milliseconds.
    pub delay_between_requests_ms: u64,
    /// When true, only links on the seed host are fetched. External links
    /// are still recorded on the page results.
    pub respect_domain_scope: bool,
    /// Verify TLS certificates. Disabling this tolerates misconfigured
    /// target sites during analysis; it is an explicit opt-out, never a
    /// hidden default.
    pub verify_tls: bool,
    /// Number of concurrent fetch workers.
    pub workers: usize,
    /// Overall wall-clock budget for the job in seconds. 0 disables it.
    pub time_budget_secs: u64,
}

impl Default for CrawlTarget {
    fn default() -> Self {
        Self {
            seed_url: String::new(),
            max_depth: 2,
            max_pages: 50,
            timeout_secs: 15,
            delay_between_requests_ms: 500,
            respect_domain_scope: true,
            verify_tls: true,
            // Small pool by default: polite to targets, still parallel.
            workers: num_cpus::get().min(4),
            time_budget_secs: 0,
        }
    }
}

impl CrawlTarget {
    /// Create a target for a seed URL with default bounds.
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms)
    }

    pub fn time_budget(&self) -> Option<Duration> {
        (self.time_budget_secs > 0).then(|| Duration::from_secs(self.time_budget_secs))
    }

    /// Validate bounds and the seed URL. Invalid configuration is a fatal,
    /// job-aborting error.
    pub fn validate(&self) -> SiteguardResult<Url> {
        if self.max_pages == 0 {
            return Err(SiteguardError::Config(
                "max_pages must be at least 1".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(SiteguardError::Config(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(SiteguardError::Config(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        let url = Url::parse(&self.seed_url)
            .or_else(|_| Url::parse(&format!("https://{}", self.seed_url)))
            .map_err(|_| SiteguardError::InvalidUrl(self.seed_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SiteguardError::InvalidUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(SiteguardError::InvalidUrl(self.seed_url.clone()));
        }
        Ok(url)
    }
}

/// Options for a security scan job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Which probe categories to run. Empty means all.
    pub categories: HashSet<FindingCategory>,
    pub timeout_secs: u64,
    pub verify_tls: bool,
    /// Concurrent probe requests.
    pub concurrency: usize,
    /// Response-time multiple over baseline that flags a time-based
    /// command injection.
    pub timing_multiplier: f64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            categories: HashSet::new(),
            timeout_secs: 10,
            verify_tls: true,
            concurrency: 4,
            timing_multiplier: 3.0,
        }
    }
}

impl ScanOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether a probe category is enabled. An empty set enables everything.
    pub fn category_enabled(&self, category: FindingCategory) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }

    pub fn validate(&self) -> SiteguardResult<()> {
        if self.concurrency == 0 {
            return Err(SiteguardError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timing_multiplier < 1.0 {
            return Err(SiteguardError::Config(
                "timing_multiplier must be >= 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Content-filter behaviour toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub remove_ads: bool,
    /// Mask detected PII in the cleaned markup.
    pub mask_private_data: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            remove_ads: true,
            mask_private_data: false,
        }
    }
}

/// Full application configuration, loadable from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub crawl: CrawlTarget,
    #[serde(default)]
    pub scan: ScanOptions,
    #[serde(default)]
    pub filter: FilterConfig,
}

impl AppConfig {
    /// Load configuration from a file, or built-in defaults if none given.
    pub fn load(path: Option<&Path>) -> SiteguardResult<Self> {
        match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let content =
                    std::fs::read_to_string(path).map_err(|e| SiteguardError::File {
                        path: path.display().to_string(),
                        message: format!("Failed to read configuration: {}", e),
                    })?;
                toml::from_str(&content).map_err(|e| {
                    SiteguardError::Config(format!("Failed to parse configuration: {}", e))
                })
            }
            None => {
                info!("No configuration file given, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> SiteguardResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SiteguardError::Serialization(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| SiteguardError::File {
            path: path.display().to_string(),
            message: format!("Failed to write configuration: {}", e),
        })?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_validates_with_seed() {
        let target = CrawlTarget::new("https://example.com");
        let url = target.validate().unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn bare_domain_gets_https_scheme() {
        let target = CrawlTarget::new("example.com");
        let url = target.validate().unwrap();
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn zero_page_budget_is_rejected() {
        let mut target = CrawlTarget::new("https://example.com");
        target.max_pages = 0;
        assert!(matches!(
            target.validate(),
            Err(SiteguardError::Config(_))
        ));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let target = CrawlTarget::new("ftp://example.com/file");
        assert!(matches!(
            target.validate(),
            Err(SiteguardError::InvalidUrl(_))
        ));
    }

    #[test]
    fn empty_category_set_enables_everything() {
        let options = ScanOptions::default();
        assert!(options.category_enabled(FindingCategory::SqlInjection));
        assert!(options.category_enabled(FindingCategory::Headers));
    }

    #[test]
    fn explicit_category_set_is_respected() {
        let mut options = ScanOptions::default();
        options.categories.insert(FindingCategory::Xss);
        assert!(options.category_enabled(FindingCategory::Xss));
        assert!(!options.category_enabled(FindingCategory::SqlInjection));
    }
}
