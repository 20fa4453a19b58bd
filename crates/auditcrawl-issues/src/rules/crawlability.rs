//! Crawlability family (spec.md §4.6): HTTP status, redirect chains,
//! response latency, broken outbound links.

use auditcrawl_types::page::PageRecord;
use serde_json::json;

const SLOW_RESPONSE_MS: u64 = 3000;

pub fn detect(page: &PageRecord) -> Vec<(String, serde_json::Value)> {
    let mut out = Vec::new();

    if page.status_code >= 500 {
        out.push(("CRAWL_5XX_ERROR".to_string(), json!({ "status_code": page.status_code })));
    } else if page.status_code >= 400 {
        out.push(("CRAWL_4XX_ERROR".to_string(), json!({ "status_code": page.status_code })));
    }

    if page.redirect_chain.len() > 1 {
        out.push((
            "CRAWL_REDIRECT_CHAIN_TOO_LONG".to_string(),
            json!({ "hops": page.redirect_chain.len() }),
        ));
    }

    if matches!(page.status_code, 302 | 307) {
        out.push(("CRAWL_TEMP_REDIRECT".to_string(), json!({ "status_code": page.status_code })));
    }

    if page.response_time_ms > SLOW_RESPONSE_MS {
        out.push((
            "CRAWL_SLOW_RESPONSE".to_string(),
            json!({ "response_time_ms": page.response_time_ms }),
        ));
    }

    if !page.broken_links.is_empty() {
        out.push((
            "CRAWL_BROKEN_LINKS".to_string(),
            json!({ "broken_links": page.broken_links }),
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::job::DiscoverySource;
    use uuid::Uuid;

    fn base_page() -> PageRecord {
        PageRecord::minimal(
            Uuid::new_v4(),
            "https://ex.test/".to_string(),
            200,
            Some("text/html".to_string()),
            100,
            "ok",
            0,
            DiscoverySource::Seed,
        )
    }

    #[test]
    fn flags_5xx_and_4xx_separately() {
        let mut page = base_page();
        page.status_code = 503;
        assert!(detect(&page).iter().any(|(c, _)| c == "CRAWL_5XX_ERROR"));

        page.status_code = 404;
        assert!(detect(&page).iter().any(|(c, _)| c == "CRAWL_4XX_ERROR"));
    }

    #[test]
    fn flags_slow_responses() {
        let mut page = base_page();
        page.response_time_ms = 5000;
        assert!(detect(&page).iter().any(|(c, _)| c == "CRAWL_SLOW_RESPONSE"));
    }
}
