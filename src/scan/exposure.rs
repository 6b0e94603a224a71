// src/scan/exposure.rs
use tracing::info;

use crate::report::{Finding, FindingCategory, Severity};

use super::payloads::{backup_candidates, SensitivePath, COMMON_SUBDIRS, SENSITIVE_PATHS};
use super::ProbeContext;

/// HEAD with a GET fallback for servers that reject HEAD outright.
async fn resource_status(ctx: &ProbeContext, url: &str) -> Option<u16> {
    match ctx.head(url, FindingCategory::ExposedFile).await {
        Some(405) | Some(501) => ctx
            .get(url, FindingCategory::ExposedFile)
            .await
            .map(|r| r.status),
        other => other,
    }
}

fn classify_sensitive(
    status: Option<u16>,
    entry: &SensitivePath,
    relative: &str,
    url: &str,
) -> Option<Finding> {
    if status != Some(200) {
        return None;
    }
    let severity = if entry.credential_bearing {
        Severity::Critical
    } else {
        Severity::High
    };
    Some(
        Finding::new(
            FindingCategory::ExposedFile,
            severity,
            format!("Exposed {}: /{}", entry.description, relative),
            url,
        )
        .with_evidence(format!(
            "{} responded 200 and should not be web-accessible",
            entry.path
        )),
    )
}

fn classify_backup(status: Option<u16>, candidate: &str, url: &str) -> Option<Finding> {
    if status != Some(200) {
        return None;
    }
    Some(
        Finding::new(
            FindingCategory::ExposedFile,
            Severity::High,
            format!("Exposed backup archive: /{}", candidate),
            url,
        )
        .with_evidence(
            "backup archives frequently contain source code and credentials".to_string(),
        ),
    )
}

/// Probe the sensitive-path catalog under the common subdirectories
/// plus a handful of crawl-discovered directories.
pub(crate) async fn probe_sensitive_paths(
    ctx: &ProbeContext,
    discovered_dirs: &[String],
) -> Vec<Finding> {
    let mut subdirs: Vec<String> = COMMON_SUBDIRS.iter().map(|s| s.to_string()).collect();
    for dir in discovered_dirs {
        let dir = dir.trim_matches('/');
        if dir.is_empty() {
            continue;
        }
        let normalized = format!("{}/", dir);
        if !subdirs.contains(&normalized) {
            subdirs.push(normalized);
        }
    }

    let mut findings = Vec::new();
    for subdir in &subdirs {
        for entry in SENSITIVE_PATHS {
            let relative = format!("{}{}", subdir, entry.path);
            let Some(url) = ctx.url_with_path(&relative) else {
                continue;
            };
            let status = resource_status(ctx, &url).await;
            if let Some(finding) = classify_sensitive(status, entry, &relative, &url) {
                info!("Exposed resource: {} ({})", url, entry.description);
                findings.push(finding);
            }
        }
    }
    findings
}

/// Probe for site backup archives derived from the host name plus a
/// generic basename list.
pub(crate) async fn probe_backup_files(ctx: &ProbeContext, host: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for candidate in backup_candidates(host) {
        let Some(url) = ctx.url_with_path(&candidate) else {
            continue;
        };
        let status = resource_status(ctx, &url).await;
        if let Some(finding) = classify_backup(status, &candidate, &url) {
            info!("Exposed backup archive: {}", url);
            findings.push(finding);
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_file_is_credential_bearing() {
        let entry = SENSITIVE_PATHS.iter().find(|e| e.path == ".env").unwrap();
        assert!(entry.credential_bearing);
    }

    #[test]
    fn server_logs_are_not_credential_bearing() {
        let entry = SENSITIVE_PATHS.iter().find(|e| e.path == "error.log").unwrap();
        assert!(!entry.credential_bearing);
    }

    #[test]
    fn reachable_env_file_is_a_critical_finding() {
        let entry = SENSITIVE_PATHS.iter().find(|e| e.path == ".env").unwrap();
        let finding =
            classify_sensitive(Some(200), entry, ".env", "https://example.com/.env").unwrap();
        assert_eq!(finding.category, FindingCategory::ExposedFile);
        assert_eq!(finding.severity, Severity::Critical);
    }

    #[test]
    fn reachable_log_file_is_high_not_critical() {
        let entry = SENSITIVE_PATHS.iter().find(|e| e.path == "error.log").unwrap();
        let finding = classify_sensitive(
            Some(200),
            entry,
            "logs/error.log",
            "https://example.com/logs/error.log",
        )
        .unwrap();
        assert_eq!(finding.severity, Severity::High);
    }

    #[test]
    fn missing_or_unreachable_resources_produce_nothing() {
        let entry = SENSITIVE_PATHS.iter().find(|e| e.path == ".env").unwrap();
        assert!(classify_sensitive(Some(404), entry, ".env", "https://example.com/.env").is_none());
        assert!(classify_sensitive(Some(403), entry, ".env", "https://example.com/.env").is_none());
        assert!(classify_sensitive(None, entry, ".env", "https://example.com/.env").is_none());
        assert!(classify_backup(Some(404), "backup.sql", "https://example.com/backup.sql").is_none());
    }

    #[test]
    fn reachable_backup_archive_is_a_high_finding() {
        let finding =
            classify_backup(Some(200), "site.tar.gz", "https://example.com/site.tar.gz").unwrap();
        assert_eq!(finding.category, FindingCategory::ExposedFile);
        assert_eq!(finding.severity, Severity::High);
        assert!(finding.title.contains("site.tar.gz"));
    }

    #[test]
    fn backup_candidates_use_host_stem() {
        let candidates = backup_candidates("www.example.com");
        assert!(candidates.contains(&"example.com.zip".to_string()));
        assert!(candidates.contains(&"example.tar.gz".to_string()));
        assert!(candidates.contains(&"backup.sql".to_string()));
    }
}
