// src/fetch/profiles.rs
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, DNT, REFERER};

/// Desktop user agents rotated by the baseline profile.
const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

const MOBILE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-S918B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
];

/// One tier of the evasion ladder. Tiers are tried in declaration order
/// until a fetch succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// Plain request with a rotated desktop user agent.
    Baseline,
    /// Adds a referrer and full Accept/Accept-Language/DNT headers.
    BrowserLike,
    /// Mobile-device user agent.
    MobileAgent,
    /// Deliberately slowed request to dodge simple rate limiters.
    SlowAndPatient,
}

impl ProfileKind {
    pub const LADDER: [ProfileKind; 4] = [
        ProfileKind::Baseline,
        ProfileKind::BrowserLike,
        ProfileKind::MobileAgent,
        ProfileKind::SlowAndPatient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Baseline => "baseline",
            ProfileKind::BrowserLike => "browser_like",
            ProfileKind::MobileAgent => "mobile_agent",
            ProfileKind::SlowAndPatient => "slow_and_patient",
        }
    }
}

/// Concrete request settings for one ladder tier.
#[derive(Debug, Clone)]
pub struct RequestProfile {
    pub kind: ProfileKind,
    pub user_agent: String,
    pub headers: HeaderMap,
    /// Pause before issuing the request.
    pub pre_request_delay: Duration,
    /// Extra time granted on top of the configured request timeout.
    pub extra_timeout: Duration,
}

impl RequestProfile {
    /// Build the profile for a ladder tier, rotating user agents where the
    /// tier calls for it.
    pub fn build(kind: ProfileKind) -> Self {
        let mut rng = rand::thread_rng();
        match kind {
            ProfileKind::Baseline => Self {
                kind,
                user_agent: pick(DESKTOP_USER_AGENTS, &mut rng),
                headers: HeaderMap::new(),
                pre_request_delay: Duration::ZERO,
                extra_timeout: Duration::ZERO,
            },
            ProfileKind::BrowserLike => {
                let mut headers = HeaderMap::new();
                headers.insert(
                    ACCEPT,
                    HeaderValue::from_static(
                        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
                    ),
                );
                headers.insert(
                    ACCEPT_LANGUAGE,
                    HeaderValue::from_static("en-US,en;q=0.9"),
                );
                headers.insert(DNT, HeaderValue::from_static("1"));
                headers.insert(
                    REFERER,
                    HeaderValue::from_static("https://www.google.com/"),
                );
                headers.insert(
                    "Upgrade-Insecure-Requests",
                    HeaderValue::from_static("1"),
                );
                Self {
                    kind,
                    user_agent: pick(DESKTOP_USER_AGENTS, &mut rng),
                    headers,
                    pre_request_delay: Duration::ZERO,
                    extra_timeout: Duration::ZERO,
                }
            }
            ProfileKind::MobileAgent => Self {
                kind,
                user_agent: pick(MOBILE_USER_AGENTS, &mut rng),
                headers: HeaderMap::new(),
                pre_request_delay: Duration::ZERO,
                extra_timeout: Duration::ZERO,
            },
            ProfileKind::SlowAndPatient => {
                let mut headers = HeaderMap::new();
                headers.insert(
                    ACCEPT_LANGUAGE,
                    HeaderValue::from_static("en-US,en;q=0.9"),
                );
                Self {
                    kind,
                    user_agent: pick(DESKTOP_USER_AGENTS, &mut rng),
                    headers,
                    pre_request_delay: Duration::from_secs(3),
                    extra_timeout: Duration::from_secs(15),
                }
            }
        }
    }
}

fn pick(agents: &[&str], rng: &mut impl rand::Rng) -> String {
    agents
        .choose(rng)
        .copied()
        .unwrap_or(DESKTOP_USER_AGENTS[0])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_order_is_fixed() {
        assert_eq!(ProfileKind::LADDER[0], ProfileKind::Baseline);
        assert_eq!(ProfileKind::LADDER[1], ProfileKind::BrowserLike);
        assert_eq!(ProfileKind::LADDER[2], ProfileKind::MobileAgent);
        assert_eq!(ProfileKind::LADDER[3], ProfileKind::SlowAndPatient);
    }

    #[test]
    fn browser_like_carries_full_header_set() {
        let profile = RequestProfile::build(ProfileKind::BrowserLike);
        assert!(profile.headers.contains_key(ACCEPT));
        assert!(profile.headers.contains_key(ACCEPT_LANGUAGE));
        assert!(profile.headers.contains_key(DNT));
        assert!(profile.headers.contains_key(REFERER));
    }

    #[test]
    fn mobile_profile_uses_mobile_agent() {
        let profile = RequestProfile::build(ProfileKind::MobileAgent);
        assert!(profile.user_agent.contains("Mobile") || profile.user_agent.contains("iPhone"));
    }

    #[test]
    fn slow_profile_stretches_timing() {
        let profile = RequestProfile::build(ProfileKind::SlowAndPatient);
        assert!(profile.pre_request_delay >= Duration::from_secs(1));
        assert!(profile.extra_timeout >= Duration::from_secs(5));
    }
}
