// src/scan/injection.rs
use std::time::Duration;

use tracing::{debug, info};

use crate::report::{Finding, FindingCategory, Severity};

use super::payloads::{
    COMMAND_PAYLOADS, OS_IDENTITY_SIGNATURES, SQLI_PAYLOADS, SQL_ERROR_SIGNATURES, XSS_PAYLOADS,
};
use super::ProbeContext;

/// First database error signature found in a response body, if any.
pub(crate) fn find_sql_error(body: &str) -> Option<&'static str> {
    let body = body.to_lowercase();
    SQL_ERROR_SIGNATURES
        .iter()
        .find(|sig| body.contains(*sig))
        .copied()
}

/// Whether a payload is reflected verbatim (unescaped) in the body.
pub(crate) fn is_reflected(body: &str, payload: &str) -> bool {
    body.contains(payload)
}

/// First OS-identity string found in a response body, if any.
pub(crate) fn find_os_identity(body: &str) -> Option<&'static str> {
    let body = body.to_lowercase();
    OS_IDENTITY_SIGNATURES
        .iter()
        .find(|sig| body.contains(*sig))
        .copied()
}

/// Timing-based detection: the response took longer than the configured
/// multiple of baseline latency, with a one-second floor so fast targets
/// do not trip on jitter.
pub(crate) fn is_timing_anomaly(baseline: Duration, elapsed: Duration, multiplier: f64) -> bool {
    let threshold = baseline.mul_f64(multiplier).max(Duration::from_secs(1));
    elapsed > threshold
}

/// Run the SQLi, XSS and command-injection batches against one query
/// parameter. Independent and order-insensitive relative to the other
/// probe batches.
pub(crate) async fn probe_parameter(ctx: &ProbeContext, parameter: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    // SQL injection: stop at the first conclusive payload per parameter.
    for payload in SQLI_PAYLOADS {
        if !ctx.options.category_enabled(FindingCategory::SqlInjection) {
            break;
        }
        let url = ctx.url_with_param(parameter, payload);
        let Some(response) = ctx.get(&url, FindingCategory::SqlInjection).await else {
            continue;
        };
        if let Some(signature) = find_sql_error(&response.body) {
            info!("SQL error signature for parameter '{}': {}", parameter, signature);
            findings.push(
                Finding::new(
                    FindingCategory::SqlInjection,
                    Severity::Critical,
                    format!("SQL injection in parameter '{}'", parameter),
                    url,
                )
                .with_parameter(parameter)
                .with_payload(*payload)
                .with_evidence(format!("database error signature: {:?}", signature)),
            );
            break;
        }
    }

    for payload in XSS_PAYLOADS {
        if !ctx.options.category_enabled(FindingCategory::Xss) {
            break;
        }
        let url = ctx.url_with_param(parameter, payload);
        let Some(response) = ctx.get(&url, FindingCategory::Xss).await else {
            continue;
        };
        if is_reflected(&response.body, payload) {
            debug!("Payload reflected unescaped for parameter '{}'", parameter);
            findings.push(
                Finding::new(
                    FindingCategory::Xss,
                    Severity::High,
                    format!("Reflected XSS in parameter '{}'", parameter),
                    url,
                )
                .with_parameter(parameter)
                .with_payload(*payload)
                .with_evidence("payload reflected unescaped in response body".to_string()),
            );
            break;
        }
    }

    for command in COMMAND_PAYLOADS {
        if !ctx.options.category_enabled(FindingCategory::CommandInjection) {
            break;
        }
        let url = ctx.url_with_param(parameter, command.payload);
        let Some(response) = ctx.get(&url, FindingCategory::CommandInjection).await else {
            continue;
        };
        let evidence = if command.timed {
            is_timing_anomaly(ctx.baseline, response.elapsed, ctx.options.timing_multiplier)
                .then(|| {
                    format!(
                        "response took {:.2}s against a {:.2}s baseline",
                        response.elapsed.as_secs_f64(),
                        ctx.baseline.as_secs_f64()
                    )
                })
        } else {
            find_os_identity(&response.body)
                .map(|sig| format!("OS identity string in response: {:?}", sig))
        };
        if let Some(evidence) = evidence {
            findings.push(
                Finding::new(
                    FindingCategory::CommandInjection,
                    Severity::Critical,
                    format!("Command injection in parameter '{}'", parameter),
                    url,
                )
                .with_parameter(parameter)
                .with_payload(command.payload)
                .with_evidence(evidence),
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
    fn mysql_error_signature_is_detected() {
        let body = "Warning: You have an error in your SQL syntax near ''1'='1'";
        assert!(find_sql_error(body).is_some());
    }

    #[test]
    fn oracle_and_mssql_signatures_are_detected() {
        assert!(find_sql_error("error ORA-00933: SQL command not properly ended").is_some());
        assert!(
            find_sql_error("Unclosed quotation mark after the character string 'x'").is_some()
        );
    }

    #[test]
    fn clean_body_has_no_sql_signature() {
        assert!(find_sql_error("<html><body>Welcome to our shop</body></html>").is_none());
    }

    #[test]
    fn verbatim_reflection_is_xss() {
        let payload = "<script>alert('XSS')</script>";
        let body = format!("<html>You searched for {}</html>", payload);
        assert!(is_reflected(&body, payload));
    }

    #[test]
    fn escaped_reflection_is_not_xss() {
        let body = "You searched for &lt;script&gt;alert('XSS')&lt;/script&gt;";
        assert!(!is_reflected(body, "<script>alert('XSS')</script>"));
    }

    #[test]
    fn os_identity_strings_are_detected() {
        assert!(find_os_identity("uid=33(www-data) gid=33(www-data)").is_some());
        assert!(find_os_identity("root:x:0:0:root:/root:/bin/bash").is_some());
        assert!(find_os_identity("plain page content").is_none());
    }

    #[test]
    fn timing_anomaly_respects_multiplier_and_floor() {
        let baseline = Duration::from_millis(100);
        // 3x baseline is 300ms, but the 1s floor governs
        assert!(!is_timing_anomaly(baseline, Duration::from_millis(600), 3.0));
        assert!(is_timing_anomaly(baseline, Duration::from_millis(1200), 3.0));

        let slow_baseline = Duration::from_secs(1);
        assert!(!is_timing_anomaly(slow_baseline, Duration::from_secs(2), 3.0));
        assert!(is_timing_anomaly(slow_baseline, Duration::from_secs(4), 3.0));
    }

}
