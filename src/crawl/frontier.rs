// src/crawl/frontier.rs
use std::collections::{HashSet, VecDeque};

use url::Url;

/// Walled-garden platforms the crawler refuses to analyze. A match is a
/// hard refusal, reported distinctly from network failure.
pub const DISALLOWED_DOMAINS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "tiktok.com",
    "youtube.com",
    "whatsapp.com",
    "messenger.com",
    "snapchat.com",
];

/// Whether a host belongs to the static disallowed-domain list.
pub fn is_disallowed_domain(host: &str) -> bool {
    let host = host.to_lowercase();
    DISALLOWED_DOMAINS
        .iter()
        .any(|blocked| host == *blocked || host.ends_with(&format!(".{}", blocked)))
}

/// Canonical form used for visited-set membership: lowercased host,
/// default port and fragment stripped, trailing slash trimmed on
/// non-root paths. Queries are kept; two URLs differing only in query
/// are distinct resources.
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    let mut out = normalized.to_string();
    if normalized.path() != "/" && normalized.query().is_none() && out.ends_with('/') {
        out.pop();
    }
    out
}

/// One scheduled URL with its discovery context.
#[derive(Debug, Clone)]
pub struct UrlRecord {
    pub url: Url,
    pub depth: usize,
    pub discovered_from: Option<String>,
}

/// The crawl frontier: FIFO queue plus visited set plus budgets.
///
/// Not internally synchronized; the scheduler wraps it in a mutex so the
/// membership-check-then-insert in [`Frontier::claim_next`] is atomic
/// under concurrency.
pub struct Frontier {
    queue: VecDeque<UrlRecord>,
    visited: HashSet<String>,
    max_depth: usize,
    max_pages: usize,
    claimed: usize,
}

impl Frontier {
    pub fn new(max_depth: usize, max_pages: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            max_depth,
            max_pages,
            claimed: 0,
        }
    }

    /// Queue a discovered URL. Depth beyond the bound or an
    /// already-visited URL is silently dropped; actual dedup happens at
    /// claim time, so queuing the same URL twice is harmless.
    pub fn enqueue(&mut self, record: UrlRecord) {
        if record.depth > self.max_depth {
            return;
        }
        if self.visited.contains(&normalize_url(&record.url)) {
            return;
        }
        self.queue.push_back(record);
    }

    /// Claim the next URL for fetching. The URL enters the visited set
    /// here — at dequeue, not at discovery — so concurrent discovery of
    /// the same URL never produces a duplicate fetch.
    pub fn claim_next(&mut self) -> Option<UrlRecord> {
        while self.claimed < self.max_pages {
            let record = self.queue.pop_front()?;
            let normalized = normalize_url(&record.url);
            if self.visited.insert(normalized) {
                self.claimed += 1;
                return Some(record);
            }
        }
        None
    }

    /// True once the page budget is spent or the queue is drained.
    pub fn is_exhausted(&self) -> bool {
        self.claimed >= self.max_pages || self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }
}
