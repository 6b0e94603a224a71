// src/report/render.rs
use std::fmt::Write as _;
use std::path::Path;

use crate::error::{SiteguardError, SiteguardResult};

use super::{SecurityReport, Severity};

/// Output format for a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ReportFormat::Json),
            "md" | "markdown" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

/// Render a report to a string in the requested format.
pub fn render_report(report: &SecurityReport, format: ReportFormat) -> SiteguardResult<String> {
    match format {
        ReportFormat::Json => {
            serde_json::to_string_pretty(report).map_err(SiteguardError::from)
        }
        ReportFormat::Markdown => Ok(render_markdown(report)),
    }
}

/// Render a report and write it to a file.
pub async fn write_report(
    report: &SecurityReport,
    format: ReportFormat,
    output_path: &Path,
) -> SiteguardResult<()> {
    let content = render_report(report, format)?;
    tokio::fs::write(output_path, content)
        .await
        .map_err(|e| SiteguardError::File {
            path: output_path.display().to_string(),
            message: format!("Failed to write report: {}", e),
        })
}

fn severity_count(report: &SecurityReport, severity: Severity) -> usize {
    report.severity_counts.get(&severity).copied().unwrap_or(0)
}

fn render_markdown(report: &SecurityReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Security Report: {}", report.target);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "**Overall score: {}/100 — risk level: {}**",
        report.overall_score,
        report.risk_level.as_str()
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Severity | Count |");
    let _ = writeln!(out, "|----------|-------|");
    for severity in [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ] {
        let _ = writeln!(
            out,
            "| {} | {} |",
            severity.as_str(),
            severity_count(report, severity)
        );
    }
    let _ = writeln!(out);

    if !report.findings.is_empty() {
        let _ = writeln!(out, "## Findings");
        let _ = writeln!(out);
        for finding in &report.findings {
            let _ = writeln!(
                out,
                "### [{}] {}",
                finding.severity.as_str().to_uppercase(),
                finding.title
            );
            let _ = writeln!(out);
            let _ = writeln!(out, "- Category: `{}`", finding.category.as_str());
            let _ = writeln!(out, "- URL: {}", finding.url);
            if let Some(parameter) = &finding.parameter {
                let _ = writeln!(out, "- Parameter: `{}`", parameter);
            }
            if let Some(payload) = &finding.payload {
                let _ = writeln!(out, "- Payload: `{}`", payload);
            }
            if !finding.evidence.is_empty() {
                let _ = writeln!(out, "- Evidence: `{}`", finding.evidence);
            }
            let _ = writeln!(out);
        }
    }

    if !report.recommendations.is_empty() {
        let _ = writeln!(out, "## Recommendations");
        let _ = writeln!(out);
        for (i, recommendation) in report.recommendations.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. **{}**: {}",
                i + 1,
                recommendation.category.as_str(),
                recommendation.advice
            );
        }
        let _ = writeln!(out);
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "## Warnings");
        let _ = writeln!(out);
        for warning in &report.warnings {
            let _ = writeln!(out, "- {}", warning);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Scan duration: {:.1}s", report.duration_secs);
    out
}
