// src/filter/rules.rs
use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Ad/tracker domains stripped by default. Matching is
/// substring-on-host, case-insensitive.
const AD_DOMAINS: &[&str] = &[
    "doubleclick.net",
    "googlesyndication.com",
    "googleadservices.com",
    "googletagmanager.com",
    "googletagservices.com",
    "google-analytics.com",
    "adservice.google.com",
    "connect.facebook.net",
    "amazon-adsystem.com",
    "scorecardresearch.com",
    "quantserve.com",
    "outbrain.com",
    "taboola.com",
    "criteo.com",
    "criteo.net",
    "adnxs.com",
    "rubiconproject.com",
    "pubmatic.com",
    "openx.net",
    "moatads.com",
    "zedo.com",
    "adroll.com",
    "popads.net",
    "propellerads.com",
    "hotjar.com",
    "mixpanel.com",
    "chartbeat.com",
];

/// Class/id/attribute fragments that mark ad containers.
const AD_SELECTORS: &[&str] = &[
    "ad",
    "ads",
    "advert",
    "advertisement",
    "ad-container",
    "ad-slot",
    "ad-banner",
    "ad-wrapper",
    "adsbox",
    "adsbygoogle",
    "banner",
    "sponsored",
    "sponsor",
    "promoted",
    "popup",
    "interstitial",
];

/// Bilingual ad keywords matched against text content and image alt text.
const AD_KEYWORDS: &[&str] = &[
    "advertisement",
    "sponsored content",
    "sponsored post",
    "promoted content",
    "paid partnership",
    "إعلان",
    "اعلان",
    "إعلانات",
    "محتوى مدفوع",
    "برعاية",
];

/// Markers of ad libraries inside inline script bodies.
const AD_SCRIPT_MARKERS: &[&str] = &[
    "adsbygoogle",
    "googletag",
    "googlesyndication",
    "doubleclick",
    "pagead2",
    "adservice",
    "taboola",
    "outbrain",
    "criteo",
    "ga('create'",
    "gtag(",
    "fbq(",
];

/// URL patterns (full regex, case-insensitive) that mark ad/tracking
/// resources regardless of domain.
const AD_URL_PATTERNS: &[&str] = &[
    r"(?i)/ads?/",
    r"(?i)/adserv",
    r"(?i)/banners?/",
    r"(?i)/sponsor",
    r"(?i)/track(ing)?[./]",
    r"(?i)/pixel[./?]",
    r"(?i)[?&]utm_[a-z]+=",
];

/// The rule set driving the content filter.
///
/// Constructor-injected and read-only during a job; mutation happens
/// only through [`FilterRuleSet::add_custom`] between jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRuleSet {
    pub domains: BTreeSet<String>,
    pub selectors: BTreeSet<String>,
    pub keywords: BTreeSet<String>,
    pub script_markers: BTreeSet<String>,
    #[serde(with = "serde_regex_vec")]
    pub url_patterns: Vec<Regex>,
}

impl Default for FilterRuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FilterRuleSet {
    /// The built-in ad/tracker rule set.
    pub fn builtin() -> Self {
        Self {
            domains: AD_DOMAINS.iter().map(|d| d.to_lowercase()).collect(),
            selectors: AD_SELECTORS.iter().map(|s| s.to_lowercase()).collect(),
            keywords: AD_KEYWORDS.iter().map(|k| k.to_lowercase()).collect(),
            script_markers: AD_SCRIPT_MARKERS.iter().map(|m| m.to_lowercase()).collect(),
            url_patterns: AD_URL_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("built-in pattern compiles"))
                .collect(),
        }
    }

    /// An empty rule set, useful for building fully custom filters.
    pub fn empty() -> Self {
        Self {
            domains: BTreeSet::new(),
            selectors: BTreeSet::new(),
            keywords: BTreeSet::new(),
            script_markers: BTreeSet::new(),
            url_patterns: Vec::new(),
        }
    }

    /// Explicit extension point: add custom rules between jobs. The only
    /// sanctioned mutation path.
    pub fn add_custom(
        &mut self,
        domains: &[String],
        selectors: &[String],
        keywords: &[String],
        url_patterns: &[String],
    ) -> Result<()> {
        for domain in domains {
            self.domains.insert(domain.to_lowercase());
        }
        for selector in selectors {
            self.selectors.insert(selector.to_lowercase());
        }
        for keyword in keywords {
            self.keywords.insert(keyword.to_lowercase());
        }
        for pattern in url_patterns {
            let compiled = Regex::new(&format!("(?i){}", pattern))
                .with_context(|| format!("Invalid filter pattern: {}", pattern))?;
            self.url_patterns.push(compiled);
        }
        info!(
            "Rule set extended: {} domains, {} selectors, {} keywords, {} patterns",
            self.domains.len(),
            self.selectors.len(),
            self.keywords.len(),
            self.url_patterns.len()
        );
        Ok(())
    }

    /// Whether a URL's host matches the domain blocklist
    /// (substring-on-domain, case-insensitive).
    pub fn matches_domain(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_lowercase();
        self.domains.iter().any(|blocked| host.contains(blocked))
    }

    /// Whether a URL matches any compiled pattern.
    pub fn matches_pattern(&self, url: &str) -> bool {
        self.url_patterns.iter().any(|re| re.is_match(url))
    }

    /// Whether a class/id/attribute value matches the selector set.
    /// Short entries match whole tokens only; longer entries match as
    /// substrings.
    pub fn matches_selector(&self, attribute_value: &str) -> bool {
        let value = attribute_value.to_lowercase();
        let tokens: Vec<&str> = value
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|t| !t.is_empty())
            .collect();
        self.selectors.iter().any(|sel| {
            if sel.len() <= 3 {
                tokens.iter().any(|t| t == sel)
            } else {
                value.contains(sel.as_str())
            }
        })
    }

    /// Whether text content contains a filter keyword (case-insensitive).
    pub fn matches_keyword(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|kw| text.contains(kw.as_str()))
    }

    /// Whether an inline script body references a known ad library.
    pub fn matches_script_marker(&self, script_body: &str) -> bool {
        let body = script_body.to_lowercase();
        self.script_markers
            .iter()
            .any(|marker| body.contains(marker.as_str()))
    }
}

/// Serde helper: regexes round-trip through their source strings.
mod serde_regex_vec {
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(patterns: &[Regex], serializer: S) -> Result<S::Ok, S::Error> {
        let sources: Vec<&str> = patterns.iter().map(|r| r.as_str()).collect();
        sources.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Regex>, D::Error> {
        let sources: Vec<String> = Vec::deserialize(deserializer)?;
        sources
            .into_iter()
            .map(|s| Regex::new(&s).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_blocklist_matches_ad_host() {
        let rules = FilterRuleSet::builtin();
        assert!(rules.matches_domain("https://doubleclick.net/ads.js"));
        assert!(rules.matches_domain("https://static.DoubleClick.net/x.js"));
        assert!(!rules.matches_domain("https://example.com/page"));
    }

    #[test]
    fn url_patterns_match_case_insensitively() {
        let rules = FilterRuleSet::builtin();
        assert!(rules.matches_pattern("https://example.com/ADS/unit.html"));
        assert!(rules.matches_pattern("https://example.com/page?utm_source=mail"));
        assert!(!rules.matches_pattern("https://example.com/roads"));
    }

    #[test]
    fn short_selectors_match_tokens_not_substrings() {
        let rules = FilterRuleSet::builtin();
        assert!(rules.matches_selector("sidebar ad unit"));
        assert!(rules.matches_selector("ad-container"));
        // "ad" must not fire inside unrelated words
        assert!(!rules.matches_selector("heading loaded"));
        assert!(rules.matches_selector("advertisement-box"));
    }

    #[test]
    fn keywords_cover_both_languages() {
        let rules = FilterRuleSet::builtin();
        assert!(rules.matches_keyword("This is a Sponsored Post about shoes"));
        assert!(rules.matches_keyword("هذا إعلان عن منتج"));
        assert!(!rules.matches_keyword("ordinary article text"));
    }

    #[test]
    fn add_custom_extends_and_validates() {
        let mut rules = FilterRuleSet::empty();
        rules
            .add_custom(
                &["ads.example".to_string()],
                &[],
                &[],
                &[r"/promo/".to_string()],
            )
            .unwrap();
        assert!(rules.matches_domain("https://ads.example/x"));
        assert!(rules.matches_pattern("https://example.com/PROMO/x"));

        let err = rules.add_custom(&[], &[], &[], &["(unclosed".to_string()]);
        assert!(err.is_err());
    }

    #[test]
    fn rule_set_round_trips_through_json() {
        let rules = FilterRuleSet::builtin();
        let json = serde_json::to_string(&rules).unwrap();
        let back: FilterRuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.domains, rules.domains);
        assert_eq!(back.url_patterns.len(), rules.url_patterns.len());
    }
}
