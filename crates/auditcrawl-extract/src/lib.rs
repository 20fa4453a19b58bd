//! # AuditCrawl Extract
//!
//! Parses a rendered HTML document into a uniform [`PageRecord`]. Extraction
//! is deterministic and pure: no network calls happen here (spec.md §4.5).

pub mod body;
pub mod head;
pub mod headings;
pub mod hreflang;
pub mod images;
pub mod keywords;
pub mod links;
pub mod markdown;
pub mod mobile;
pub mod reading_level;
pub mod structured_data;

use auditcrawl_types::page::{PageRecord, RedirectHop};
use auditcrawl_types::job::DiscoverySource;
use scraper::Html;
use uuid::Uuid;

/// Transport metadata the fetcher carries over into extraction; everything
/// else is derived purely from the DOM.
#[derive(Debug, Clone)]
pub struct TransportMeta {
    pub status_code: u16,
    pub redirect_url: Option<String>,
    pub redirect_chain: Vec<RedirectHop>,
    pub content_type: Option<String>,
    pub response_time_ms: u64,
}

/// Run the full extraction pipeline over one page's final HTML.
pub fn extract(
    crawl_id: Uuid,
    final_url: &str,
    project_domain: &str,
    depth: u32,
    discovered_via: DiscoverySource,
    html: &str,
    transport: TransportMeta,
) -> PageRecord {
    let document = Html::parse_document(html);
    let base = url::Url::parse(final_url).ok();

    let mut warnings = Vec::new();

    let head = head::extract(&document, final_url);
    let heading = headings::extract(&document);
    let link_sets = links::extract(&document, base.as_ref(), project_domain);
    let image_stats = images::extract(&document);
    let body_text = body::extract_plain_text(&document);
    let word_count = body::word_count(&body_text);
    let page_size_bytes = html.len() as u64;
    let text_html_ratio = body::text_to_html_ratio(&body_text, html);
    let md = markdown::to_markdown(&document);

    let density = keywords::density(&body_text);
    let reading = reading_level::analyze(&body_text);

    let structured = structured_data::extract(&document, &mut warnings);
    let hreflang_tags = hreflang::extract(&document, base.as_ref(), final_url, &mut warnings);
    let mobile = mobile::analyze(&document, &body_text);

    let indexability_reason = indexability_reason(transport.status_code, head.robots_meta.as_deref());
    let is_indexable = indexability_reason.is_none();

    let is_self_canonical = head.canonical_url.as_deref().map(|canon| {
        normalize_for_compare(canon) == normalize_for_compare(final_url)
    });

    let has_schema = !structured.schema_types.is_empty();
    let is_https = final_url.starts_with("https://");
    let has_mixed_content = is_https.then(|| body::has_mixed_content(&document, final_url));

    let (path, query_string) = split_path_query(final_url);

    let analysis = serde_json::json!({
        "keyword_density": density,
        "reading_level": reading,
        "structured_data": structured.payload,
        "mobile": mobile,
        "hreflang_validation": hreflang::validate(&hreflang_tags, final_url),
        "text_to_html_ratio": text_html_ratio,
    });

    PageRecord {
        id: None,
        crawl_id,
        url: final_url.to_string(),
        url_hash: auditcrawl_types::sha256_hex(final_url),
        path,
        query_string,
        status_code: transport.status_code,
        redirect_url: transport.redirect_url,
        redirect_chain: transport.redirect_chain,
        content_type: transport.content_type,
        response_time_ms: transport.response_time_ms,
        page_size_bytes,
        word_count,
        page_depth: depth,
        title: head.title.clone(),
        title_length: head.title.as_ref().map(|t| t.chars().count() as u32),
        meta_description: head.meta_description.clone(),
        meta_description_length: head.meta_description.as_ref().map(|d| d.chars().count() as u32),
        canonical_url: head.canonical_url,
        is_self_canonical,
        h1_tags: heading.h1_tags,
        h2_tags: heading.h2_tags,
        h1_count: heading.h1_count,
        h2_count: heading.h2_count,
        heading_tag_order: heading.tag_order,
        robots_meta: head.robots_meta,
        is_indexable,
        indexability_reason,
        internal_links: link_sets.internal,
        external_links: link_sets.external,
        internal_links_count: link_sets.internal_count,
        external_links_count: link_sets.external_count,
        internal_links_received: 0,
        broken_links: Vec::new(),
        images_count: image_stats.total,
        images_without_alt: image_stats.without_alt,
        images_with_empty_alt: image_stats.with_empty_alt,
        lcp_ms: None,
        fcp_ms: None,
        ttfb_ms: None,
        cls_score: None,
        inp_ms: None,
        is_mobile_friendly: Some(mobile.is_mobile_friendly()),
        viewport_configured: Some(head.viewport.is_some()),
        schema_types: structured.schema_types,
        has_schema,
        og_title: head.og_title,
        og_description: head.og_description,
        og_image: head.og_image,
        twitter_card: head.twitter_card,
        is_https,
        has_mixed_content,
        html_lang: head.html_lang,
        hreflang_tags,
        content_hash: auditcrawl_types::sha256_hex(&body::collapse_whitespace(&body_text)),
        body_text: md,
        discovered_via,
        parse_warnings: warnings,
        analysis,
    }
}

/// Indexability reason per spec.md §4.5: HTTP>=400 -> error; 300<=HTTP<400 ->
/// redirect; robots contains "noindex" -> noindex directive; else indexable
/// (`None`).
fn indexability_reason(status_code: u16, robots_meta: Option<&str>) -> Option<String> {
    if status_code >= 400 {
        return Some(format!("HTTP {status_code} error"));
    }
    if (300..400).contains(&status_code) {
        return Some("Redirect".to_string());
    }
    if let Some(robots) = robots_meta {
        if robots.to_lowercase().contains("noindex") {
            return Some("noindex directive".to_string());
        }
    }
    None
}

/// Normalize a canonical URL against the current URL for self-reference
/// comparison: strip fragment, drop trailing slash.
fn normalize_for_compare(url: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(url) else {
        return url.trim_end_matches('/').to_string();
    };
    parsed.set_fragment(None);
    let mut s = parsed.to_string();
    if s.ends_with('/') && parsed.path() != "/" {
        s.pop();
    }
    s
}

fn split_path_query(url: &str) -> (String, String) {
    match url::Url::parse(url) {
        Ok(u) => (
            u.path().to_string(),
            u.query().unwrap_or_default().to_string(),
        ),
        Err(_) => (url.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexability_reason_prioritizes_http_errors() {
        assert_eq!(
            indexability_reason(404, Some("index")),
            Some("HTTP 404 error".to_string())
        );
        assert_eq!(
            indexability_reason(301, None),
            Some("Redirect".to_string())
        );
        assert_eq!(
            indexability_reason(200, Some("noindex, follow")),
            Some("noindex directive".to_string())
        );
        assert_eq!(indexability_reason(200, Some("index, follow")), None);
    }

    #[test]
    fn extract_produces_a_full_page_record() {
        let html = r#"<html lang="en"><head>
            <title>Example Page Title Here</title>
            <meta name="description" content="A description of the example page that is reasonably long.">
            <link rel="canonical" href="https://ex.test/page">
            <meta name="viewport" content="width=device-width, initial-scale=1">
        </head><body>
            <h1>Main Heading</h1>
            <p>Some body content with enough words to count as real text for this page about testing extraction pipelines thoroughly and carefully.</p>
            <a href="/other">Other</a>
            <a href="https://external.test/x">External</a>
            <img src="/a.png" alt="">
        </body></html>"#;

        let record = extract(
            Uuid::new_v4(),
            "https://ex.test/page",
            "ex.test",
            0,
            DiscoverySource::Seed,
            html,
            TransportMeta {
                status_code: 200,
                redirect_url: None,
                redirect_chain: Vec::new(),
                content_type: Some("text/html".to_string()),
                response_time_ms: 120,
            },
        );

        assert_eq!(record.title.as_deref(), Some("Example Page Title Here"));
        assert!(record.is_indexable);
        assert_eq!(record.is_self_canonical, Some(true));
        assert_eq!(record.h1_count, 1);
        assert_eq!(record.internal_links_count, 1);
        assert_eq!(record.external_links_count, 1);
        assert_eq!(record.images_with_empty_alt, 1);
        assert!(record.word_count > 0);
    }
}
