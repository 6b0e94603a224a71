// src/report/score.rs
use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use super::{Finding, FindingCategory, Recommendation, RiskLevel, SecurityReport, Severity};
use crate::filter::FilterOutcome;

/// Fixed deduction applied per finding in a category.
pub fn category_weight(category: FindingCategory) -> u32 {
    match category {
        FindingCategory::SqlInjection => 25,
        FindingCategory::CommandInjection => 25,
        FindingCategory::DirectoryTraversal => 20,
        FindingCategory::ExposedFile => 15,
        FindingCategory::Xss => 15,
        FindingCategory::AdminPanel => 8,
        FindingCategory::InfoDisclosure => 6,
        FindingCategory::Ssl => 5,
        FindingCategory::Headers => 3,
    }
}

fn category_advice(category: FindingCategory) -> &'static str {
    match category {
        FindingCategory::SqlInjection => {
            "Use parameterized queries or prepared statements for every database access; never interpolate user input into SQL."
        }
        FindingCategory::CommandInjection => {
            "Never pass user input to a shell; use safe process-spawning APIs with argument arrays and strict allow-lists."
        }
        FindingCategory::DirectoryTraversal => {
            "Canonicalize and validate file paths server-side; reject any resolved path outside the intended document root."
        }
        FindingCategory::ExposedFile => {
            "Remove configuration files, version-control metadata and backups from the web root, and deny access to dotfiles at the server level."
        }
        FindingCategory::Xss => {
            "Encode all user-controlled output for its HTML context and deploy a restrictive Content-Security-Policy."
        }
        FindingCategory::AdminPanel => {
            "Restrict administrative interfaces by network location or VPN and enforce multi-factor authentication on them."
        }
        FindingCategory::InfoDisclosure => {
            "Disable verbose error pages and server version banners in production."
        }
        FindingCategory::Ssl => {
            "Serve all content over HTTPS with a valid certificate and redirect plain HTTP to it."
        }
        FindingCategory::Headers => {
            "Add the missing security headers (Content-Security-Policy, Strict-Transport-Security, X-Frame-Options, X-Content-Type-Options) and set Secure/HttpOnly on session cookies."
        }
    }
}

/// Folds filter statistics and scanner findings into a bounded score,
/// a risk tier, and ranked recommendations.
pub struct RiskAggregator {
    target: String,
}

impl RiskAggregator {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Compile the final report. The score starts at 100, subtracts the
    /// fixed per-category weight for every finding, and floors at 0.
    pub fn score(
        &self,
        filter_outcomes: &[FilterOutcome],
        findings: Vec<Finding>,
        warnings: Vec<String>,
        duration_secs: f64,
    ) -> SecurityReport {
        let mut deduction: u32 = 0;
        for finding in &findings {
            deduction = deduction.saturating_add(category_weight(finding.category));
        }
        let overall_score = 100u32.saturating_sub(deduction);
        debug!(
            "Scored {} findings: total deduction {}, final score {}",
            findings.len(),
            deduction,
            overall_score
        );

        let mut severity_counts: HashMap<Severity, usize> = HashMap::new();
        for finding in &findings {
            *severity_counts.entry(finding.severity).or_insert(0) += 1;
        }

        let recommendations = Self::recommendations(&findings);

        let mut findings = findings;
        findings.sort_by_key(|f| f.severity.sort_order());

        let mut warnings = warnings;
        let removed_total: usize = filter_outcomes.iter().map(|o| o.removed_count).sum();
        if removed_total > 0 {
            warnings.push(format!(
                "Content filter removed {} ad/tracker elements across {} pages",
                removed_total,
                filter_outcomes.len()
            ));
        }

        SecurityReport {
            target: self.target.clone(),
            generated_at: Utc::now(),
            overall_score,
            risk_level: RiskLevel::from_score(overall_score),
            findings,
            recommendations,
            severity_counts,
            warnings,
            duration_secs,
        }
    }

    /// One recommendation per non-empty category, ordered by weight
    /// descending.
    fn recommendations(findings: &[Finding]) -> Vec<Recommendation> {
        let mut present: Vec<FindingCategory> = Vec::new();
        for finding in findings {
            if !present.contains(&finding.category) {
                present.push(finding.category);
            }
        }
        present.sort_by(|a, b| category_weight(*b).cmp(&category_weight(*a)));
        present
            .into_iter()
            .map(|category| Recommendation {
                category,
                advice: category_advice(category).to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(category: FindingCategory, severity: Severity) -> Finding {
        Finding::new(category, severity, "test", "https://example.com")
    }

    #[test]
    fn empty_findings_score_perfect() {
        let report = RiskAggregator::new("https://example.com").score(&[], vec![], vec![], 0.0);
        assert_eq!(report.overall_score, 100);
        assert_eq!(report.risk_level, RiskLevel::Low);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn score_is_monotonically_non_increasing() {
        let aggregator = RiskAggregator::new("https://example.com");
        let mut findings = Vec::new();
        let mut last_score = 100;
        for _ in 0..10 {
            findings.push(finding(FindingCategory::Headers, Severity::Low));
            let report = aggregator.score(&[], findings.clone(), vec![], 0.0);
            assert!(report.overall_score <= last_score);
            last_score = report.overall_score;
        }
    }

    #[test]
    fn score_floors_at_zero() {
        let aggregator = RiskAggregator::new("https://example.com");
        let findings: Vec<Finding> = (0..20)
            .map(|_| finding(FindingCategory::SqlInjection, Severity::Critical))
            .collect();
        let report = aggregator.score(&[], findings, vec![], 0.0);
        assert_eq!(report.overall_score, 0);
        assert_eq!(report.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn recommendations_are_deduplicated_and_weight_ordered() {
        let aggregator = RiskAggregator::new("https://example.com");
        let findings = vec![
            finding(FindingCategory::Headers, Severity::Low),
            finding(FindingCategory::SqlInjection, Severity::Critical),
            finding(FindingCategory::Headers, Severity::Low),
            finding(FindingCategory::ExposedFile, Severity::High),
        ];
        let report = aggregator.score(&[], findings, vec![], 0.0);
        let categories: Vec<FindingCategory> = report
            .recommendations
            .iter()
            .map(|r| r.category)
            .collect();
        assert_eq!(
            categories,
            vec![
                FindingCategory::SqlInjection,
                FindingCategory::ExposedFile,
                FindingCategory::Headers,
            ]
        );
    }

    #[test]
    fn findings_are_sorted_severity_descending() {
        let aggregator = RiskAggregator::new("https://example.com");
        let findings = vec![
            finding(FindingCategory::Headers, Severity::Low),
            finding(FindingCategory::SqlInjection, Severity::Critical),
        ];
        let report = aggregator.score(&[], findings, vec![], 0.0);
        assert_eq!(report.findings[0].severity, Severity::Critical);
    }

    #[test]
    fn filter_statistics_surface_as_warning() {
        let aggregator = RiskAggregator::new("https://example.com");
        let outcome = FilterOutcome {
            removed_count: 3,
            original_size: 1000,
            cleaned_size: 800,
        };
        let report = aggregator.score(&[outcome], vec![], vec![], 0.0);
        assert!(report.warnings.iter().any(|w| w.contains("3")));
    }
}
