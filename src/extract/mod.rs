// src/extract/mod.rs
use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::fetch::FetchResult;

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static META: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());
static STYLESHEET: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel=\"stylesheet\"][href]").unwrap());
static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script[src]").unwrap());
static FONT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel=\"preload\"][as=\"font\"][href]").unwrap());
static FORM: Lazy<Selector> = Lazy::new(|| Selector::parse("form").unwrap());
static FORM_FIELD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, select, textarea").unwrap());
static HTML_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("html").unwrap());
static BODY_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// A hyperlink found on a page, classified against the seed host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLink {
    pub url: String,
    pub text: String,
    pub internal: bool,
}

/// Static asset references found on a page, absolutized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageAssets {
    pub images: Vec<String>,
    pub css: Vec<String>,
    pub js: Vec<String>,
    pub fonts: Vec<String>,
}

/// A form field definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub field_type: String,
    pub required: bool,
}

/// A form definition: action resolved against the page URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageForm {
    pub action: String,
    pub method: String,
    pub fields: Vec<FormField>,
}

/// Structured data extracted from one fetched page. Owned exclusively by
/// the extractor once built; read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub title: String,
    /// description, keywords, language, word_count…
    pub meta: HashMap<String, String>,
    /// Heading text keyed by level, "h1" through "h6".
    pub headings: HashMap<String, Vec<String>>,
    pub links: Vec<PageLink>,
    pub assets: PageAssets,
    pub forms: Vec<PageForm>,
    /// Raw markup, kept for the content filter.
    pub raw_html: String,
}

impl PageResult {
    /// URLs of internal links only, for frontier scheduling.
    pub fn internal_links(&self) -> impl Iterator<Item = &str> {
        self.links
            .iter()
            .filter(|l| l.internal)
            .map(|l| l.url.as_str())
    }

    /// Query-parameter names present on the page's own URL and its
    /// internal links; scanner probe input.
    pub fn query_parameters(&self) -> HashSet<String> {
        let mut params = HashSet::new();
        let mut collect = |raw: &str| {
            if let Ok(url) = Url::parse(raw) {
                for (name, _) in url.query_pairs() {
                    if !name.is_empty() {
                        params.insert(name.to_string());
                    }
                }
            }
        };
        collect(&self.url);
        for link in &self.links {
            collect(&link.url);
        }
        params
    }
}

/// Parse a fetched page into structured data.
///
/// Parsing is best-effort: malformed markup never fails the page, and
/// missing elements yield empty collections.
pub fn extract(fetch: &FetchResult, seed_host: &str) -> PageResult {
    let page_url = Url::parse(&fetch.final_url)
        .or_else(|_| Url::parse(&fetch.url))
        .ok();
    let document = Html::parse_document(&fetch.body);

    let mut result = PageResult {
        url: fetch.final_url.clone(),
        raw_html: fetch.body.clone(),
        ..Default::default()
    };

    result.title = document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    extract_meta(&document, &mut result.meta);
    extract_headings(&document, &mut result.headings);

    if let Some(page_url) = &page_url {
        extract_links(&document, page_url, seed_host, &mut result.links);
        extract_assets(&document, page_url, &mut result.assets);
        extract_forms(&document, page_url, &mut result.forms);
    }

    debug!(
        "Extracted {}: {} links, {} images, {} forms",
        result.url,
        result.links.len(),
        result.assets.images.len(),
        result.forms.len()
    );
    result
}

fn extract_meta(document: &Html, meta: &mut HashMap<String, String>) {
    for element in document.select(&META) {
        let name = element.value().attr("name").unwrap_or_default();
        let content = element.value().attr("content").unwrap_or_default();
        if content.is_empty() {
            continue;
        }
        match name.to_lowercase().as_str() {
            "description" => {
                meta.insert("description".to_string(), content.to_string());
            }
            "keywords" => {
                meta.insert("keywords".to_string(), content.to_string());
            }
            _ => {}
        }
    }

    if let Some(html_el) = document.select(&HTML_TAG).next() {
        if let Some(lang) = html_el.value().attr("lang") {
            meta.insert("language".to_string(), lang.to_string());
        }
    }

    if let Some(body) = document.select(&BODY_TAG).next() {
        let text: String = body.text().collect::<Vec<_>>().join(" ");
        let word_count = text.split_whitespace().count();
        meta.insert("word_count".to_string(), word_count.to_string());
    }
}

fn extract_headings(document: &Html, headings: &mut HashMap<String, Vec<String>>) {
    for level in 1..=6 {
        let tag = format!("h{}", level);
        // Static tag names; the selector always parses.
        let selector = Selector::parse(&tag).unwrap();
        let texts: Vec<String> = document
            .select(&selector)
            .map(|h| h.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !texts.is_empty() {
            headings.insert(tag, texts);
        }
    }
}

fn extract_links(document: &Html, page_url: &Url, seed_host: &str, links: &mut Vec<PageLink>) {
    let mut seen = HashSet::new();
    for element in document.select(&ANCHOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let trimmed = href.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("javascript:")
            || trimmed.starts_with("mailto:")
            || trimmed.starts_with("tel:")
        {
            continue;
        }
        // Resolve against the page's own URL, not the crawl seed.
        let Ok(resolved) = page_url.join(trimmed) else {
            trace!("Unresolvable href {:?} on {}", trimmed, page_url);
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let url = resolved.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }
        let internal = resolved
            .host_str()
            .map(|host| hosts_match(host, seed_host))
            .unwrap_or(false);
        links.push(PageLink {
            url,
            text: element.text().collect::<String>().trim().to_string(),
            internal,
        });
    }
}

/// Host comparison that treats `www.` as equivalent to the bare domain.
pub fn hosts_match(a: &str, b: &str) -> bool {
    let strip = |h: &str| {
        h.strip_prefix("www.")
            .map(str::to_string)
            .unwrap_or_else(|| h.to_string())
            .to_lowercase()
    };
    strip(a) == strip(b)
}

fn extract_assets(document: &Html, page_url: &Url, assets: &mut PageAssets) {
    let mut push = |raw: &str, bucket: &mut Vec<String>| {
        if let Ok(resolved) = page_url.join(raw.trim()) {
            let url = resolved.to_string();
            if !bucket.contains(&url) {
                bucket.push(url);
            }
        }
    };

    for element in document.select(&IMG) {
        if let Some(src) = element.value().attr("src") {
            push(src, &mut assets.images);
        }
    }
    for element in document.select(&STYLESHEET) {
        if let Some(href) = element.value().attr("href") {
            push(href, &mut assets.css);
        }
    }
    for element in document.select(&SCRIPT) {
        if let Some(src) = element.value().attr("src") {
            push(src, &mut assets.js);
        }
    }
    for element in document.select(&FONT_LINK) {
        if let Some(href) = element.value().attr("href") {
            push(href, &mut assets.fonts);
        }
    }
}

fn extract_forms(document: &Html, page_url: &Url, forms: &mut Vec<PageForm>) {
    for element in document.select(&FORM) {
        let action = element.value().attr("action").unwrap_or_default();
        let action = page_url
            .join(action)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| page_url.to_string());
        let method = element
            .value()
            .attr("method")
            .unwrap_or("get")
            .to_lowercase();

        let mut fields = Vec::new();
        for field in element.select(&FORM_FIELD) {
            let name = field.value().attr("name").unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            let field_type = match field.value().name() {
                "select" => "select".to_string(),
                "textarea" => "textarea".to_string(),
                _ => field.value().attr("type").unwrap_or("text").to_string(),
            };
            fields.push(FormField {
                name: name.to_string(),
                field_type,
                required: field.value().attr("required").is_some(),
            });
        }

        forms.push(PageForm {
            action,
            method,
            fields,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ProfileKind;
    use std::time::Duration;

    fn fetch_result(url: &str, body: &str) -> FetchResult {
        FetchResult {
            url: url.to_string(),
            final_url: url.to_string(),
            status_code: 200,
            headers: Vec::new(),
            body: body.to_string(),
            elapsed: Duration::from_millis(10),
            method_used: ProfileKind::Baseline,
            error: None,
        }
    }

    const SAMPLE: &str = r##"<!DOCTYPE html>
        <html lang="en"><head>
        <title> Sample Page </title>
        <meta name="description" content="A test page">
        <meta name="keywords" content="test,sample">
        <link rel="stylesheet" href="/css/site.css">
        </head><body>
        <h1>Welcome</h1><h2>Section A</h2><h2>Section B</h2>
        <a href="/about">About us</a>
        <a href="https://other.example.org/page">Elsewhere</a>
        <a href="#frag">Skip</a>
        <a href="mailto:x@example.com">Mail</a>
        <img src="logo.png" alt="logo">
        <script src="/js/app.js"></script>
        <form action="/search" method="GET">
          <input type="text" name="q" required>
          <select name="cat"><option>a</option></select>
        </form>
        </body></html>"##;

    #[test]
    fn extracts_title_meta_and_headings() {
        let page = extract(&fetch_result("https://example.com/", SAMPLE), "example.com");
        assert_eq!(page.title, "Sample Page");
        assert_eq!(page.meta.get("description").unwrap(), "A test page");
        assert_eq!(page.meta.get("language").unwrap(), "en");
        assert_eq!(page.headings.get("h1").unwrap(), &vec!["Welcome".to_string()]);
        assert_eq!(page.headings.get("h2").unwrap().len(), 2);
    }

    #[test]
    fn links_are_absolutized_and_classified() {
        let page = extract(&fetch_result("https://example.com/", SAMPLE), "example.com");
        // fragment and mailto links are skipped
        assert_eq!(page.links.len(), 2);
        let about = page.links.iter().find(|l| l.url.contains("about")).unwrap();
        assert_eq!(about.url, "https://example.com/about");
        assert!(about.internal);
        let ext = page.links.iter().find(|l| l.url.contains("other")).unwrap();
        assert!(!ext.internal);
    }

    #[test]
    fn assets_resolve_against_page_url() {
        let page = extract(
            &fetch_result("https://example.com/sub/page.html", SAMPLE),
            "example.com",
        );
        assert_eq!(page.assets.images, vec!["https://example.com/sub/logo.png"]);
        assert_eq!(page.assets.css, vec!["https://example.com/css/site.css"]);
        assert_eq!(page.assets.js, vec!["https://example.com/js/app.js"]);
    }

    #[test]
    fn forms_capture_fields_and_method() {
        let page = extract(&fetch_result("https://example.com/", SAMPLE), "example.com");
        assert_eq!(page.forms.len(), 1);
        let form = &page.forms[0];
        assert_eq!(form.action, "https://example.com/search");
        assert_eq!(form.method, "get");
        assert_eq!(form.fields.len(), 2);
        assert!(form.fields[0].required);
        assert_eq!(form.fields[1].field_type, "select");
    }

    #[test]
    fn malformed_markup_yields_empty_but_valid_page() {
        let page = extract(
            &fetch_result("https://example.com/", "<<<not <html at all"),
            "example.com",
        );
        assert!(page.title.is_empty());
        assert!(page.links.is_empty());
        assert!(page.forms.is_empty());
    }

    #[test]
    fn www_prefix_counts_as_internal() {
        let body = r#"<a href="https://www.example.com/x">x</a>"#;
        let page = extract(&fetch_result("https://example.com/", body), "example.com");
        assert!(page.links[0].internal);
    }

    #[test]
    fn query_parameters_are_collected() {
        let body = r#"<a href="/items?id=1&cat=2">items</a>"#;
        let page = extract(
            &fetch_result("https://example.com/?page=3", body),
            "example.com",
        );
        let params = page.query_parameters();
        assert!(params.contains("id"));
        assert!(params.contains("cat"));
        assert!(params.contains("page"));
    }
}
