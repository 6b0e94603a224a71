// src/scan/mod.rs
mod admin;
mod exposure;
mod headers;
mod injection;
mod payloads;
mod traversal;

pub use payloads::DEFAULT_PARAMETERS;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ScanOptions;
use crate::crawl::is_disallowed_domain;
use crate::error::{SiteguardError, SiteguardResult};
use crate::fetch::probe_client;
use crate::report::{Finding, FindingCategory};

/// One probe response, reduced to what classification needs.
#[derive(Debug, Clone)]
pub(crate) struct ProbeResponse {
    pub status: u16,
    pub body: String,
    pub elapsed: Duration,
}

/// Shared state for a scan job. Every outgoing request flows through
/// [`ProbeContext::get`]/[`ProbeContext::head`], which throttle through
/// one semaphore and record failures as warnings. Probes are read-only:
/// GET and HEAD are the only verbs this module ever sends.
pub(crate) struct ProbeContext {
    client: Client,
    pub base: Url,
    pub options: ScanOptions,
    pub baseline: Duration,
    permits: Semaphore,
    warnings: Mutex<Vec<String>>,
}

impl ProbeContext {
    /// Base URL with one query parameter set to a payload, preserving
    /// the other parameters.
    pub fn url_with_param(&self, parameter: &str, value: &str) -> String {
        let mut url = self.base.clone();
        let existing: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            let mut replaced = false;
            for (key, val) in &existing {
                if key == parameter {
                    pairs.append_pair(key, value);
                    replaced = true;
                } else {
                    pairs.append_pair(key, val);
                }
            }
            if !replaced {
                pairs.append_pair(parameter, value);
            }
        }
        url.to_string()
    }

    /// Base URL joined with a relative path.
    pub fn url_with_path(&self, path: &str) -> Option<String> {
        let mut root = self.base.clone();
        root.set_query(None);
        root.set_path("/");
        root.join(path).ok().map(|u| u.to_string())
    }

    /// Throttled GET. A failed probe request is logged and skipped,
    /// never aborting the scan.
    pub async fn get(&self, url: &str, category: FindingCategory) -> Option<ProbeResponse> {
        let _permit = self.permits.acquire().await.ok()?;
        let start = Instant::now();
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                Some(ProbeResponse {
                    status,
                    body,
                    elapsed: start.elapsed(),
                })
            }
            Err(e) => {
                self.record_probe_failure(category, url, &e.to_string());
                None
            }
        }
    }

    /// Throttled HEAD, returning only the status code.
    pub async fn head(&self, url: &str, category: FindingCategory) -> Option<u16> {
        let _permit = self.permits.acquire().await.ok()?;
        match self.client.head(url).send().await {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                self.record_probe_failure(category, url, &e.to_string());
                None
            }
        }
    }

    fn record_probe_failure(&self, category: FindingCategory, url: &str, message: &str) {
        debug!("Probe failed ({}) for {}: {}", category.as_str(), url, message);
        self.warnings
            .lock()
            .push(format!("{} probe skipped for {}: {}", category.as_str(), url, message));
    }
}

/// Result of a scan: findings plus the warnings for every skipped probe.
#[derive(Debug)]
pub struct ScanRun {
    pub findings: Vec<Finding>,
    pub warnings: Vec<String>,
    pub duration_secs: f64,
}

/// Probe a target for the enabled finding categories.
///
/// `parameters` and `paths` come from crawl extraction; with no
/// discovered parameters a default synthetic set is used. Batches are
/// independent and order-insensitive.
pub async fn scan(
    seed_url: &str,
    parameters: &HashSet<String>,
    paths: &[String],
    options: &ScanOptions,
) -> SiteguardResult<ScanRun> {
    options.validate()?;
    let started = Instant::now();

    let base = Url::parse(seed_url)
        .or_else(|_| Url::parse(&format!("https://{}", seed_url)))
        .map_err(|_| SiteguardError::InvalidUrl(seed_url.to_string()))?;
    let host = base
        .host_str()
        .ok_or_else(|| SiteguardError::InvalidUrl(seed_url.to_string()))?
        .to_string();
    if is_disallowed_domain(&host) {
        return Err(SiteguardError::BlockedDomain(host));
    }

    let client = probe_client(options.timeout(), options.verify_tls)?;

    // Baseline request: measures latency for timing-based checks and
    // supplies headers for the passive checks. Unreachable seed is the
    // one fatal probe failure.
    let baseline_start = Instant::now();
    let baseline_response = client
        .get(base.clone())
        .send()
        .await
        .map_err(|e| SiteguardError::BlockedOrUnreachable {
            url: base.to_string(),
            last_error: e.to_string(),
        })?;
    // Wire-order pair list so repeated Set-Cookie headers all reach the
    // passive checks.
    let baseline_headers: Vec<(String, String)> = baseline_response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let _ = baseline_response.text().await;
    let baseline = baseline_start.elapsed();
    debug!("Baseline latency for {}: {:?}", base, baseline);

    let ctx = Arc::new(ProbeContext {
        client,
        base: base.clone(),
        options: options.clone(),
        baseline,
        permits: Semaphore::new(options.concurrency),
        warnings: Mutex::new(Vec::new()),
    });

    let mut parameters: Vec<String> = if parameters.is_empty() {
        info!("No discovered parameters; probing the default synthetic set");
        DEFAULT_PARAMETERS.iter().map(|p| p.to_string()).collect()
    } else {
        parameters.iter().cloned().collect()
    };
    parameters.sort();

    let mut handles: Vec<JoinHandle<Vec<Finding>>> = Vec::new();

    let injection_enabled = options.category_enabled(FindingCategory::SqlInjection)
        || options.category_enabled(FindingCategory::Xss)
        || options.category_enabled(FindingCategory::CommandInjection);
    if injection_enabled {
        for parameter in &parameters {
            let ctx = ctx.clone();
            let parameter = parameter.clone();
            handles.push(tokio::spawn(async move {
                injection::probe_parameter(&ctx, &parameter).await
            }));
        }
    }

    if options.category_enabled(FindingCategory::DirectoryTraversal) {
        for parameter in &parameters {
            let ctx = ctx.clone();
            let parameter = parameter.clone();
            handles.push(tokio::spawn(async move {
                traversal::probe_parameter(&ctx, &parameter).await
            }));
        }
    }

    if options.category_enabled(FindingCategory::ExposedFile) {
        let ctx_clone = ctx.clone();
        let extra_paths: Vec<String> = paths.iter().take(5).cloned().collect();
        handles.push(tokio::spawn(async move {
            exposure::probe_sensitive_paths(&ctx_clone, &extra_paths).await
        }));
        let ctx_clone = ctx.clone();
        let backup_host = host.clone();
        handles.push(tokio::spawn(async move {
            exposure::probe_backup_files(&ctx_clone, &backup_host).await
        }));
    }

    if options.category_enabled(FindingCategory::AdminPanel) {
        let ctx_clone = ctx.clone();
        handles.push(tokio::spawn(async move {
            admin::probe_admin_paths(&ctx_clone).await
        }));
    }

    let mut findings = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(mut batch) => findings.append(&mut batch),
            Err(e) => warn!("Probe batch panicked: {}", e),
        }
    }

    // Passive checks ride on the baseline response; no extra requests.
    findings.extend(headers::check_baseline(
        &base,
        &baseline_headers,
        options,
    ));

    let warnings = std::mem::take(&mut *ctx.warnings.lock());
    let duration_secs = started.elapsed().as_secs_f64();
    info!(
        "Scan of {} finished: {} findings, {} skipped probes, {:.1}s",
        base,
        findings.len(),
        warnings.len(),
        duration_secs
    );
    Ok(ScanRun {
        findings,
        warnings,
        duration_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_for(url: &str) -> ProbeContext {
        ProbeContext {
            client: Client::new(),
            base: Url::parse(url).unwrap(),
            options: ScanOptions::default(),
            baseline: Duration::from_millis(50),
            permits: Semaphore::new(1),
            warnings: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn url_with_param_replaces_existing_value() {
        let ctx = context_for("https://example.com/search?q=shoes&page=2");
        let url = ctx.url_with_param("q", "'");
        assert!(url.contains("q=%27"));
        assert!(url.contains("page=2"));
    }

    #[test]
    fn url_with_param_appends_missing_parameter() {
        let ctx = context_for("https://example.com/");
        let url = ctx.url_with_param("id", "1");
        assert_eq!(url, "https://example.com/?id=1");
    }

    #[test]
    fn url_with_path_joins_at_site_root() {
        let ctx = context_for("https://example.com/deep/page?x=1");
        let url = ctx.url_with_path(".env").unwrap();
        assert_eq!(url, "https://example.com/.env");
    }

    #[tokio::test]
    async fn disallowed_domain_is_refused() {
        let err = scan(
            "https://facebook.com",
            &HashSet::new(),
            &[],
            &ScanOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SiteguardError::BlockedDomain(_)));
    }

    #[tokio::test]
    async fn invalid_options_are_fatal() {
        let mut options = ScanOptions::default();
        options.concurrency = 0;
        let err = scan("https://example.com", &HashSet::new(), &[], &options)
            .await
            .unwrap_err();
        assert!(matches!(err, SiteguardError::Config(_)));
    }
}
