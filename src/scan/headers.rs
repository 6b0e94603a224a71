// src/scan/headers.rs
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::config::ScanOptions;
use crate::report::{Finding, FindingCategory, Severity};

static VERSION_BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[a-z][a-z0-9_.-]*/\d[\d.]*").unwrap());

const REQUIRED_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "mitigates injected-script execution",
    ),
    ("x-frame-options", "prevents clickjacking via framing"),
    (
        "x-content-type-options",
        "prevents MIME sniffing of responses",
    ),
];

fn header<'a>(headers: &'a [(String, String)], name: &'a str) -> Option<&'a str> {
    header_values(headers, name).next()
}

fn header_values<'a>(
    headers: &'a [(String, String)],
    name: &'a str,
) -> impl Iterator<Item = &'a str> {
    headers
        .iter()
        .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Passive checks over the baseline response: transport security,
/// security headers, cookie flags and server version banners. No
/// additional requests are made. Headers arrive as a wire-order pair
/// list; repeated names are checked individually.
pub(crate) fn check_baseline(
    base: &Url,
    headers: &[(String, String)],
    options: &ScanOptions,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let https = base.scheme() == "https";
    let url = base.to_string();

    if options.category_enabled(FindingCategory::Ssl) && !https {
        findings.push(
            Finding::new(
                FindingCategory::Ssl,
                Severity::Medium,
                "Site served over plain HTTP".to_string(),
                url.clone(),
            )
            .with_evidence("traffic is unencrypted and can be intercepted or modified".to_string()),
        );
    }

    if options.category_enabled(FindingCategory::Headers) {
        for (name, purpose) in REQUIRED_HEADERS {
            if header(headers, name).is_none() {
                findings.push(
                    Finding::new(
                        FindingCategory::Headers,
                        Severity::Low,
                        format!("Missing security header: {}", name),
                        url.clone(),
                    )
                    .with_evidence(format!("{} header {}", name, purpose)),
                );
            }
        }
        if https && header(headers, "strict-transport-security").is_none() {
            findings.push(
                Finding::new(
                    FindingCategory::Headers,
                    Severity::Low,
                    "Missing security header: strict-transport-security".to_string(),
                    url.clone(),
                )
                .with_evidence("HSTS pins browsers to HTTPS for future visits".to_string()),
            );
        }
        for cookie in header_values(headers, "set-cookie") {
            let lower = cookie.to_lowercase();
            let mut missing = Vec::new();
            if https && !lower.contains("secure") {
                missing.push("Secure");
            }
            if !lower.contains("httponly") {
                missing.push("HttpOnly");
            }
            if !missing.is_empty() {
                findings.push(
                    Finding::new(
                        FindingCategory::Headers,
                        Severity::Low,
                        format!("Session cookie missing {} flag(s)", missing.join("/")),
                        url.clone(),
                    )
                    .with_evidence(format!("Set-Cookie: {}", cookie)),
                );
            }
        }
    }

    if options.category_enabled(FindingCategory::InfoDisclosure) {
        if let Some(server) = header(headers, "server") {
            if VERSION_BANNER.is_match(server) {
                findings.push(
                    Finding::new(
                        FindingCategory::InfoDisclosure,
                        Severity::Low,
                        "Server header discloses software version".to_string(),
                        url.clone(),
                    )
                    .with_evidence(format!("Server: {}", server)),
                );
            }
        }
        if let Some(powered) = header(headers, "x-powered-by") {
            findings.push(
                Finding::new(
                    FindingCategory::InfoDisclosure,
                    Severity::Low,
                    "X-Powered-By header discloses platform".to_string(),
                    url,
                )
                .with_evidence(format!("X-Powered-By: {}", powered)),
            );
        }
    }

    findings
}
