// src/crawl/scheduler.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlTarget;
use crate::extract::{extract, PageResult};
use crate::fetch::{Fetcher, ProfileKind};

use super::frontier::{normalize_url, Frontier, UrlRecord};

/// Shared crawl counters, updated atomically by the workers.
#[derive(Debug, Default)]
pub struct CrawlStats {
    pub pages_fetched: AtomicUsize,
    pub fetch_failures: AtomicUsize,
    pub bytes_fetched: AtomicUsize,
    pub links_discovered: AtomicUsize,
    /// Successes per evasion-ladder tier, indexed by ladder position.
    pub tier_successes: [AtomicUsize; 4],
}

impl CrawlStats {
    pub fn record_success(&self, tier: ProfileKind, bytes: usize) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        self.bytes_fetched.fetch_add(bytes, Ordering::Relaxed);
        let index = ProfileKind::LADDER
            .iter()
            .position(|k| *k == tier)
            .unwrap_or(0);
        self.tier_successes[index].fetch_add(1, Ordering::Relaxed);
    }

    /// Plain-value snapshot for reporting.
    pub fn snapshot(&self) -> CrawlStatsSnapshot {
        CrawlStatsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            bytes_fetched: self.bytes_fetched.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            tier_successes: ProfileKind::LADDER
                .iter()
                .enumerate()
                .map(|(i, kind)| (*kind, self.tier_successes[i].load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrawlStatsSnapshot {
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub bytes_fetched: usize,
    pub links_discovered: usize,
    pub tier_successes: Vec<(ProfileKind, usize)>,
}

/// Per-host politeness gate: reserves the next allowed fetch instant for
/// a host so concurrent workers keep the configured spacing.
struct PolitenessGate {
    next_allowed: Mutex<HashMap<String, Instant>>,
    delay: Duration,
}

impl PolitenessGate {
    fn new(delay: Duration) -> Self {
        Self {
            next_allowed: Mutex::new(HashMap::new()),
            delay,
        }
    }

    /// Reserve a slot for `host` and return how long to wait for it.
    fn reserve(&self, host: &str) -> Duration {
        if self.delay.is_zero() {
            return Duration::ZERO;
        }
        let mut slots = self.next_allowed.lock();
        let now = Instant::now();
        let slot = slots
            .entry(host.to_string())
            .or_insert(now);
        let wait = slot.saturating_duration_since(now);
        *slot = (*slot).max(now) + self.delay;
        wait
    }
}

/// Bounded worker pool that drains the frontier.
pub struct CrawlScheduler {
    fetcher: Arc<Fetcher>,
    frontier: Arc<Mutex<Frontier>>,
    politeness: Arc<PolitenessGate>,
    stats: Arc<CrawlStats>,
    cancelled: Arc<AtomicBool>,
    seed_host: String,
    target: CrawlTarget,
}

impl CrawlScheduler {
    pub fn new(
        fetcher: Arc<Fetcher>,
        frontier: Arc<Mutex<Frontier>>,
        stats: Arc<CrawlStats>,
        cancelled: Arc<AtomicBool>,
        seed_host: String,
        target: CrawlTarget,
    ) -> Self {
        let politeness = Arc::new(PolitenessGate::new(target.request_delay()));
        Self {
            fetcher,
            frontier,
            politeness,
            stats,
            cancelled,
            seed_host,
            target,
        }
    }

    /// Run the worker pool until the frontier is exhausted, the time
    /// budget expires, or cancellation is requested. Returns the pages
    /// gathered and the warnings recorded along the way.
    pub async fn run(&self) -> (Vec<PageResult>, Vec<String>) {
        let deadline = self.target.time_budget().map(|budget| Instant::now() + budget);
        let pages: Arc<Mutex<Vec<PageResult>>> = Arc::new(Mutex::new(Vec::new()));
        let warnings: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(self.target.workers);
        for worker_id in 0..self.target.workers {
            let fetcher = self.fetcher.clone();
            let frontier = self.frontier.clone();
            let politeness = self.politeness.clone();
            let stats = self.stats.clone();
            let cancelled = self.cancelled.clone();
            let pages = pages.clone();
            let warnings = warnings.clone();
            let in_flight = in_flight.clone();
            let seed_host = self.seed_host.clone();
            let respect_scope = self.target.respect_domain_scope;

            handles.push(tokio::spawn(async move {
                debug!("Crawl worker {} started", worker_id);
                loop {
                    if cancelled.load(Ordering::Relaxed) {
                        debug!("Worker {} stopping: cancelled", worker_id);
                        break;
                    }
                    if let Some(deadline) = deadline {
                        if Instant::now() >= deadline {
                            debug!("Worker {} stopping: time budget spent", worker_id);
                            break;
                        }
                    }

                    // Count ourselves busy before claiming so a peer never
                    // observes an empty queue with zero in-flight workers
                    // while a claim is still being processed.
                    in_flight.fetch_add(1, Ordering::AcqRel);
                    let claimed = frontier.lock().claim_next();
                    let Some(record) = claimed else {
                        let busy = in_flight.fetch_sub(1, Ordering::AcqRel) - 1;
                        if busy == 0 {
                            break;
                        }
                        sleep(Duration::from_millis(25)).await;
                        continue;
                    };

                    Self::process(
                        &fetcher,
                        &frontier,
                        &politeness,
                        &stats,
                        &pages,
                        &warnings,
                        &seed_host,
                        respect_scope,
                        record,
                    )
                    .await;
                    in_flight.fetch_sub(1, Ordering::AcqRel);
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Crawl worker panicked: {}", e);
            }
        }

        let pages = std::mem::take(&mut *pages.lock());
        let warnings = std::mem::take(&mut *warnings.lock());
        (pages, warnings)
    }

    #[allow(clippy::too_many_arguments)]
    async fn process(
        fetcher: &Fetcher,
        frontier: &Mutex<Frontier>,
        politeness: &PolitenessGate,
        stats: &CrawlStats,
        pages: &Mutex<Vec<PageResult>>,
        warnings: &Mutex<Vec<String>>,
        seed_host: &str,
        respect_scope: bool,
        record: UrlRecord,
    ) {
        if let Some(host) = record.url.host_str() {
            let wait = politeness.reserve(host);
            if !wait.is_zero() {
                sleep(wait).await;
            }
        }

        let url = record.url.to_string();
        match fetcher.fetch(&url).await {
            Ok(fetch_result) => {
                stats.record_success(fetch_result.method_used, fetch_result.body.len());
                let page = extract(&fetch_result, seed_host);

                let mut discovered = 0usize;
                {
                    let mut frontier = frontier.lock();
                    for link in &page.links {
                        if respect_scope && !link.internal {
                            continue;
                        }
                        if let Ok(link_url) = Url::parse(&link.url) {
                            frontier.enqueue(UrlRecord {
                                url: link_url,
                                depth: record.depth + 1,
                                discovered_from: Some(normalize_url(&record.url)),
                            });
                            discovered += 1;
                        }
                    }
                }
                stats.links_discovered.fetch_add(discovered, Ordering::Relaxed);

                pages.lock().push(page);
            }
            Err(e) => {
                // A failed fetch drops this URL only; the job continues.
                stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
                warnings.lock().push(format!("{}: {}", url, e));
                info!("Fetch failed for {} at depth {}: {}", url, record.depth, e);
            }
        }
    }
}
