// src/report/mod.rs
mod render;
mod score;

pub use render::{render_report, write_report, ReportFormat};
pub use score::{category_weight, RiskAggregator};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a detected security issue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    SqlInjection,
    Xss,
    CommandInjection,
    DirectoryTraversal,
    ExposedFile,
    AdminPanel,
    InfoDisclosure,
    Ssl,
    Headers,
}

impl FindingCategory {
    pub const ALL: [FindingCategory; 9] = [
        FindingCategory::SqlInjection,
        FindingCategory::Xss,
        FindingCategory::CommandInjection,
        FindingCategory::DirectoryTraversal,
        FindingCategory::ExposedFile,
        FindingCategory::AdminPanel,
        FindingCategory::InfoDisclosure,
        FindingCategory::Ssl,
        FindingCategory::Headers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCategory::SqlInjection => "sql_injection",
            FindingCategory::Xss => "xss",
            FindingCategory::CommandInjection => "command_injection",
            FindingCategory::DirectoryTraversal => "directory_traversal",
            FindingCategory::ExposedFile => "exposed_file",
            FindingCategory::AdminPanel => "admin_panel",
            FindingCategory::InfoDisclosure => "info_disclosure",
            FindingCategory::Ssl => "ssl",
            FindingCategory::Headers => "headers",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sql_injection" | "sqli" => Some(FindingCategory::SqlInjection),
            "xss" => Some(FindingCategory::Xss),
            "command_injection" => Some(FindingCategory::CommandInjection),
            "directory_traversal" | "traversal" => Some(FindingCategory::DirectoryTraversal),
            "exposed_file" => Some(FindingCategory::ExposedFile),
            "admin_panel" => Some(FindingCategory::AdminPanel),
            "info_disclosure" => Some(FindingCategory::InfoDisclosure),
            "ssl" => Some(FindingCategory::Ssl),
            "headers" => Some(FindingCategory::Headers),
            _ => None,
        }
    }
}

/// Finding severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Sort order: higher severity sorts first.
    pub fn sort_order(&self) -> usize {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

/// A single detected security issue.
///
/// Findings are append-only; the scanner never deduplicates across
/// categories because two categories may legitimately share evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub category: FindingCategory,
    pub severity: Severity,
    pub title: String,
    /// URL or path the finding applies to.
    pub url: String,
    /// Query parameter involved, when the probe targeted one.
    pub parameter: Option<String>,
    /// Payload that triggered the finding, when the probe carried one.
    pub payload: Option<String>,
    /// Matched response evidence (error signature, reflected string…).
    pub evidence: String,
    pub discovered_at: DateTime<Utc>,
}

impl Finding {
    pub fn new(
        category: FindingCategory,
        severity: Severity,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category,
            severity,
            title: title.into(),
            url: url.into(),
            parameter: None,
            payload: None,
            evidence: String::new(),
            discovered_at: Utc::now(),
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = evidence.into();
        self
    }
}

/// Risk tier derived from the numeric score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Direct threshold mapping of the final score.
    pub fn from_score(score: u32) -> Self {
        match score {
            80..=100 => RiskLevel::Low,
            60..=79 => RiskLevel::Medium,
            40..=59 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// A ranked remediation recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: FindingCategory,
    pub advice: String,
}

/// Final report for a scan job. Recomputed from scratch each run,
/// never patched incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReport {
    pub target: String,
    pub generated_at: DateTime<Utc>,
    /// Bounded 0-100; 100 means no deductions.
    pub overall_score: u32,
    pub risk_level: RiskLevel,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub severity_counts: HashMap<Severity, usize>,
    /// Warnings gathered during the scan (skipped probes, transport
    /// failures). Always surfaced; never a silent empty success.
    pub warnings: Vec<String>,
    pub duration_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_tiers_map_thresholds() {
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(80), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(79), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(59), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(39), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Critical);
    }

    #[test]
    fn category_round_trips_through_strings() {
        for category in FindingCategory::ALL {
            assert_eq!(
                FindingCategory::from_str_opt(category.as_str()),
                Some(category)
            );
        }
    }

    #[test]
    fn severity_sorts_critical_first() {
        let mut severities = vec![Severity::Low, Severity::Critical, Severity::Medium];
        severities.sort_by_key(|s| s.sort_order());
        assert_eq!(severities[0], Severity::Critical);
        assert_eq!(severities[2], Severity::Low);
    }
}
