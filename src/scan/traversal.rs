// src/scan/traversal.rs
use tracing::info;

use crate::report::{Finding, FindingCategory, Severity};

use super::payloads::{OS_FILE_SIGNATURES, TRAVERSAL_PAYLOADS};
use super::ProbeContext;

/// First OS file signature found in a response body, if any. A finding
/// requires this evidence; a 200 alone proves nothing.
pub(crate) fn find_os_file_signature(body: &str) -> Option<&'static str> {
    let body = body.to_lowercase();
    OS_FILE_SIGNATURES
        .iter()
        .find(|sig| body.contains(&sig.to_lowercase()))
        .copied()
}

/// Payloads carry their own encoding (plain, single- and double-encoded
/// variants), so the query string is assembled without re-encoding.
fn traversal_url(ctx: &ProbeContext, parameter: &str, payload: &str) -> String {
    let mut url = ctx.base.clone();
    url.set_query(None);
    format!("{}?{}={}", url, parameter, payload)
}

/// Path traversal batch for one query parameter.
pub(crate) async fn probe_parameter(ctx: &ProbeContext, parameter: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for payload in TRAVERSAL_PAYLOADS {
        let url = traversal_url(ctx, parameter, payload);
        let Some(response) = ctx.get(&url, FindingCategory::DirectoryTraversal).await else {
            continue;
        };
        if let Some(signature) = find_os_file_signature(&response.body) {
            info!(
                "OS file signature for parameter '{}': {}",
                parameter, signature
            );
            findings.push(
                Finding::new(
                    FindingCategory::DirectoryTraversal,
                    Severity::High,
                    format!("Path traversal in parameter '{}'", parameter),
                    url,
                )
                .with_parameter(parameter)
                .with_payload(*payload)
                .with_evidence(format!("OS file signature in response: {:?}", signature)),
            );
            break;
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwd_content_is_recognized() {
        let body = "root:x:0:0:root:/root:/bin/bash\ndaemon:x:1:1:daemon:/usr/sbin:/bin/false";
        assert_eq!(find_os_file_signature(body), Some("root:x:0:0"));
    }

    #[test]
    fn win_ini_content_is_recognized() {
        let body = "; for 16-bit app support\n[fonts]\n[extensions]";
        assert!(find_os_file_signature(body).is_some());
    }

    #[test]
    fn ordinary_page_has_no_signature() {
        assert!(find_os_file_signature("<html><body>Not found</body></html>").is_none());
    }

    #[test]
    fn encoded_payloads_are_not_reencoded() {
        assert!(TRAVERSAL_PAYLOADS.iter().any(|p| p.contains("%2e")));
    }
}
