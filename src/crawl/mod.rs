// src/crawl/mod.rs
mod frontier;
mod scheduler;

pub use frontier::{is_disallowed_domain, normalize_url, Frontier, UrlRecord, DISALLOWED_DOMAINS};
pub use scheduler::{CrawlScheduler, CrawlStats, CrawlStatsSnapshot};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CrawlTarget;
use crate::error::{SiteguardError, SiteguardResult};
use crate::extract::{extract, PageResult};
use crate::fetch::Fetcher;

/// Everything a finished (or cancelled) crawl hands back: pages, shared
/// counters, and the per-URL warnings recovered along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub pages: Vec<PageResult>,
    pub stats: CrawlStatsSnapshot,
    pub warnings: Vec<String>,
    pub duration_secs: f64,
}

/// Breadth-first crawl of a site within the target's bounds.
///
/// The seed failing through every request profile is the only fetch
/// failure that aborts the job; every other failed URL is recorded as a
/// warning and skipped.
pub async fn crawl(target: &CrawlTarget) -> SiteguardResult<CrawlOutcome> {
    crawl_with_cancel(target, Arc::new(AtomicBool::new(false))).await
}

/// Crawl with an external cancellation signal. On cancellation, partial
/// results already collected are returned rather than discarded.
pub async fn crawl_with_cancel(
    target: &CrawlTarget,
    cancelled: Arc<AtomicBool>,
) -> SiteguardResult<CrawlOutcome> {
    let started = Instant::now();
    let seed = target.validate()?;

    let seed_host = seed
        .host_str()
        .ok_or_else(|| SiteguardError::InvalidUrl(target.seed_url.clone()))?
        .to_string();
    if is_disallowed_domain(&seed_host) {
        warn!("Refusing to crawl disallowed domain {}", seed_host);
        return Err(SiteguardError::BlockedDomain(seed_host));
    }

    info!(
        "Starting crawl of {} (max_depth={}, max_pages={}, workers={})",
        seed, target.max_depth, target.max_pages, target.workers
    );

    let fetcher = Arc::new(Fetcher::new(target.timeout(), target.verify_tls)?);
    let stats = Arc::new(CrawlStats::default());
    let frontier = Arc::new(Mutex::new(Frontier::new(target.max_depth, target.max_pages)));

    // The seed is fetched eagerly: its failure is terminal, and its links
    // prime the frontier for the workers.
    let seed_record = {
        let mut guard = frontier.lock();
        guard.enqueue(UrlRecord {
            url: seed.clone(),
            depth: 0,
            discovered_from: None,
        });
        guard.claim_next()
    }
    .ok_or_else(|| SiteguardError::Config("page budget is zero".to_string()))?;

    let seed_fetch = match fetcher.fetch(seed_record.url.as_str()).await {
        Ok(result) => result,
        Err(e) => {
            return Err(SiteguardError::BlockedOrUnreachable {
                url: seed.to_string(),
                last_error: e.to_string(),
            });
        }
    };
    stats.record_success(seed_fetch.method_used, seed_fetch.body.len());
    let seed_page = extract(&seed_fetch, &seed_host);

    {
        let mut guard = frontier.lock();
        for link in &seed_page.links {
            if target.respect_domain_scope && !link.internal {
                continue;
            }
            if let Ok(link_url) = url::Url::parse(&link.url) {
                guard.enqueue(UrlRecord {
                    url: link_url,
                    depth: 1,
                    discovered_from: Some(normalize_url(&seed)),
                });
            }
        }
    }

    let scheduler = CrawlScheduler::new(
        fetcher,
        frontier,
        stats.clone(),
        cancelled,
        seed_host,
        target.clone(),
    );
    let (mut pages, warnings) = scheduler.run().await;
    pages.insert(0, seed_page);

    let outcome = CrawlOutcome {
        pages,
        stats: stats.snapshot(),
        warnings,
        duration_secs: started.elapsed().as_secs_f64(),
    };
    info!(
        "Crawl finished: {} pages, {} failures, {:.1}s",
        outcome.pages.len(),
        outcome.stats.fetch_failures,
        outcome.duration_secs
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disallowed_domain_is_a_hard_refusal() {
        let target = CrawlTarget::new("https://facebook.com/somepage");
        let err = crawl(&target).await.unwrap_err();
        assert!(matches!(err, SiteguardError::BlockedDomain(_)));
    }

    #[tokio::test]
    async fn invalid_configuration_aborts_before_any_fetch() {
        let mut target = CrawlTarget::new("https://example.com");
        target.max_pages = 0;
        let err = crawl(&target).await.unwrap_err();
        assert!(matches!(err, SiteguardError::Config(_)));
    }

    #[tokio::test]
    async fn disallowed_subdomain_is_refused() {
        let target = CrawlTarget::new("https://m.facebook.com/x");
        let err = crawl(&target).await.unwrap_err();
        assert!(matches!(err, SiteguardError::BlockedDomain(_)));
    }
}
