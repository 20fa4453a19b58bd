//! `PageRecord` — one crawled page (spec.md §3, §6).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::job::DiscoverySource;

/// One hop in a redirect chain, as observed by the fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectHop {
    pub url: String,
    pub status_code: u16,
}

/// One crawled page, persisted once per successful extraction.
///
/// `(crawl_id, url_hash)` is unique; `url_hash = SHA-256(url)` (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: Option<Uuid>,
    pub crawl_id: Uuid,

    pub url: String,
    pub url_hash: String,
    pub path: String,
    pub query_string: String,

    pub status_code: u16,
    pub redirect_url: Option<String>,
    pub redirect_chain: Vec<RedirectHop>,
    pub content_type: Option<String>,
    pub response_time_ms: u64,
    pub page_size_bytes: u64,

    pub word_count: u32,
    pub page_depth: u32,

    pub title: Option<String>,
    pub title_length: Option<u32>,
    pub meta_description: Option<String>,
    pub meta_description_length: Option<u32>,
    pub canonical_url: Option<String>,
    pub is_self_canonical: Option<bool>,

    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub h1_count: u32,
    pub h2_count: u32,
    pub heading_tag_order: Vec<String>,

    pub robots_meta: Option<String>,
    pub is_indexable: bool,
    pub indexability_reason: Option<String>,

    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub internal_links_count: u32,
    pub external_links_count: u32,
    pub internal_links_received: u32,
    pub broken_links: Vec<String>,

    pub images_count: u32,
    pub images_without_alt: u32,
    pub images_with_empty_alt: u32,

    pub lcp_ms: Option<f64>,
    pub fcp_ms: Option<f64>,
    pub ttfb_ms: Option<f64>,
    pub cls_score: Option<f64>,
    pub inp_ms: Option<f64>,

    pub is_mobile_friendly: Option<bool>,
    pub viewport_configured: Option<bool>,

    pub schema_types: Vec<String>,
    pub has_schema: bool,

    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub twitter_card: Option<String>,

    pub is_https: bool,
    pub has_mixed_content: Option<bool>,

    pub html_lang: Option<String>,
    pub hreflang_tags: Vec<crate::ports::extractor::HreflangTag>,

    pub content_hash: String,
    pub body_text: String,

    pub discovered_via: DiscoverySource,

    /// Non-fatal diagnostics accumulated during extraction (spec.md §7 item 3).
    pub parse_warnings: Vec<String>,

    /// Keyword density, reading level, structured-data and validation results
    /// that don't have a first-class PageRecord column of their own; kept as
    /// structured JSON so the issue detector and API layer can read them
    /// without every sub-extraction needing a dedicated SQL column.
    pub analysis: serde_json::Value,
}

impl PageRecord {
    /// Minimal record for a non-HTML or failed fetch (spec.md §4.4 outcome
    /// classification).
    pub fn minimal(
        crawl_id: Uuid,
        url: String,
        status_code: u16,
        content_type: Option<String>,
        response_time_ms: u64,
        reason: impl Into<String>,
        depth: u32,
        discovered_via: DiscoverySource,
    ) -> Self {
        let url_hash = crate::sha256_hex(&url);
        let (path, query_string) = split_path_query(&url);
        let is_https = url.starts_with("https://");
        Self {
            id: None,
            crawl_id,
            url,
            url_hash,
            path,
            query_string,
            status_code,
            redirect_url: None,
            redirect_chain: Vec::new(),
            content_type,
            response_time_ms,
            page_size_bytes: 0,
            word_count: 0,
            page_depth: depth,
            title: None,
            title_length: None,
            meta_description: None,
            meta_description_length: None,
            canonical_url: None,
            is_self_canonical: None,
            h1_tags: Vec::new(),
            h2_tags: Vec::new(),
            h1_count: 0,
            h2_count: 0,
            heading_tag_order: Vec::new(),
            robots_meta: None,
            is_indexable: false,
            indexability_reason: Some(reason.into()),
            internal_links: Vec::new(),
            external_links: Vec::new(),
            internal_links_count: 0,
            external_links_count: 0,
            internal_links_received: 0,
            broken_links: Vec::new(),
            images_count: 0,
            images_without_alt: 0,
            images_with_empty_alt: 0,
            lcp_ms: None,
            fcp_ms: None,
            ttfb_ms: None,
            cls_score: None,
            inp_ms: None,
            is_mobile_friendly: None,
            viewport_configured: None,
            schema_types: Vec::new(),
            has_schema: false,
            og_title: None,
            og_description: None,
            og_image: None,
            twitter_card: None,
            is_https,
            has_mixed_content: None,
            html_lang: None,
            hreflang_tags: Vec::new(),
            content_hash: crate::sha256_hex(""),
            body_text: String::new(),
            discovered_via,
            parse_warnings: Vec::new(),
            analysis: serde_json::Value::Null,
        }
    }
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
