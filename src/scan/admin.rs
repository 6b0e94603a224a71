// src/scan/admin.rs
use tracing::info;

use crate::report::{Finding, FindingCategory, Severity};

use super::payloads::{ADMIN_KEYWORDS, ADMIN_PATHS, LOGIN_KEYWORDS};
use super::ProbeContext;

/// What a 200 response at an administrative path looks like.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PanelKind {
    AdminInterface,
    LoginPage,
    Unclassified,
}

pub(crate) fn classify_panel(body: &str) -> PanelKind {
    let body = body.to_lowercase();
    if ADMIN_KEYWORDS.iter().any(|kw| body.contains(kw)) {
        PanelKind::AdminInterface
    } else if LOGIN_KEYWORDS.iter().any(|kw| body.contains(kw)) {
        PanelKind::LoginPage
    } else {
        PanelKind::Unclassified
    }
}

/// Probe the well-known administrative paths and classify what answers.
pub(crate) async fn probe_admin_paths(ctx: &ProbeContext) -> Vec<Finding> {
    let mut findings = Vec::new();
    for path in ADMIN_PATHS {
        let Some(url) = ctx.url_with_path(path) else {
            continue;
        };
        let Some(response) = ctx.get(&url, FindingCategory::AdminPanel).await else {
            continue;
        };
        if response.status != 200 {
            continue;
        }
        let (severity, title, evidence) = match classify_panel(&response.body) {
            PanelKind::AdminInterface => (
                Severity::Medium,
                format!("Administrative interface at /{}", path),
                "page content matches administrative interface keywords",
            ),
            PanelKind::LoginPage => (
                Severity::Medium,
                format!("Login page at /{}", path),
                "page content contains a login form",
            ),
            PanelKind::Unclassified => (
                Severity::Low,
                format!("Possible admin panel at /{}", path),
                "path responded 200 but content was not classified",
            ),
        };
        info!("{}", title);
        findings.push(
            Finding::new(FindingCategory::AdminPanel, severity, title, url)
                .with_evidence(evidence.to_string()),
        );
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_keywords_win_over_login_keywords() {
        let body = "<h1>Admin Panel</h1><input type=\"password\" name=\"pw\">";
        assert_eq!(classify_panel(body), PanelKind::AdminInterface);
    }

    #[test]
    fn password_field_marks_a_login_page() {
        let body = "<form><input type=\"password\" name=\"pw\"></form>";
        assert_eq!(classify_panel(body), PanelKind::LoginPage);
    }

    #[test]
    fn plain_content_is_unclassified() {
        assert_eq!(classify_panel("<p>Welcome</p>"), PanelKind::Unclassified);
    }
}
