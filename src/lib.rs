pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod report;
pub mod scan;

// Re-export main types for easier access
pub use config::{AppConfig, CrawlTarget, FilterConfig, ScanOptions};
pub use crawl::CrawlOutcome;
pub use error::{NetworkError, SiteguardError, SiteguardResult};
pub use extract::PageResult;
pub use filter::{ContentFilter, FilterOutcome, FilterRuleSet, PrivacyFilter};
pub use report::{
    Finding, FindingCategory, ReportFormat, RiskLevel, SecurityReport, Severity,
};

use std::collections::HashSet;

use tracing::info;

/// Crawl a site within the target's bounds.
pub async fn run_crawl(target: &CrawlTarget) -> SiteguardResult<CrawlOutcome> {
    crawl::crawl(target).await
}

/// Clean one fetched page against a rule set, returning the cleaned
/// markup and removal statistics.
pub fn run_content_filter(page: &PageResult, rules: FilterRuleSet) -> (String, FilterOutcome) {
    ContentFilter::new(rules).filter_page(page)
}

/// Probe a single URL with no prior crawl: discovered parameters fall
/// back to the synthetic defaults.
pub async fn run_security_scan(
    seed_url: &str,
    options: &ScanOptions,
) -> SiteguardResult<SecurityReport> {
    let run = scan::scan(seed_url, &HashSet::new(), &[], options).await?;
    Ok(report::RiskAggregator::new(seed_url).score(&[], run.findings, run.warnings, run.duration_secs))
}

/// Full pipeline: crawl, filter every page, then scan with the
/// parameters and directories the crawl discovered.
pub async fn run_assessment(
    target: &CrawlTarget,
    filter_config: &FilterConfig,
    options: &ScanOptions,
) -> SiteguardResult<SecurityReport> {
    let outcome = crawl::crawl(target).await?;
    info!(
        "Crawl finished: {} pages, {} warnings",
        outcome.pages.len(),
        outcome.warnings.len()
    );

    let mut filter_outcomes = Vec::new();
    if filter_config.remove_ads {
        let content_filter = ContentFilter::new(FilterRuleSet::builtin());
        for page in &outcome.pages {
            let (_, stats) = content_filter.filter_page(page);
            filter_outcomes.push(stats);
        }
    }

    let mut parameters: HashSet<String> = HashSet::new();
    let mut directories: Vec<String> = Vec::new();
    for page in &outcome.pages {
        parameters.extend(page.query_parameters());
        if let Some(dir) = parent_directory(&page.url) {
            if !dir.is_empty() && !directories.contains(&dir) {
                directories.push(dir);
            }
        }
    }

    let run = scan::scan(&target.seed_url, &parameters, &directories, options).await?;
    let mut warnings = outcome.warnings;
    warnings.extend(run.warnings);
    Ok(report::RiskAggregator::new(&target.seed_url).score(
        &filter_outcomes,
        run.findings,
        warnings,
        outcome.duration_secs + run.duration_secs,
    ))
}

/// Directory portion of a page URL path ("/a/b/page.html" -> "a/b").
fn parent_directory(page_url: &str) -> Option<String> {
    let url = url::Url::parse(page_url).ok()?;
    let path = url.path();
    let dir = path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    Some(dir.trim_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_directory_strips_the_leaf() {
        assert_eq!(
            parent_directory("https://example.com/a/b/page.html"),
            Some("a/b".to_string())
        );
        assert_eq!(
            parent_directory("https://example.com/"),
            Some(String::new())
        );
    }
}
