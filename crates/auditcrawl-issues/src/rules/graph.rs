//! Graph family (spec.md §4.8): issues that depend on the whole site graph
//! rather than a single page in isolation — incoming link counts and depth,
//! both of which are only known once the frontier has drained and
//! `internal_links_received` has been flushed onto every `PageRecord`.
//!
//! Unlike the other families in [`crate::rules`], these are not run as part
//! of the per-page crawl-time `detect()` pass (spec.md §4.6 step 5 runs
//! before the back-reference table is flushed); the post-crawl analyzer
//! calls [`detect`] explicitly after flush (spec.md §4.8 steps 1-3).

use auditcrawl_types::job::DiscoverySource;
use auditcrawl_types::page::PageRecord;
use serde_json::json;

const DEEP_THRESHOLD: u32 = 4;
const VERY_DEEP_THRESHOLD: u32 = 7;
const HIGH_OUTBOUND_THRESHOLD: u32 = 150;

pub fn detect(page: &PageRecord) -> Vec<(String, serde_json::Value)> {
    let mut out = Vec::new();

    if !page.is_indexable {
        return out;
    }

    if page.page_depth > VERY_DEEP_THRESHOLD {
        out.push(("page_very_deep".to_string(), json!({ "depth": page.page_depth })));
    } else if page.page_depth > DEEP_THRESHOLD {
        out.push(("page_too_deep".to_string(), json!({ "depth": page.page_depth })));
    }

    if page.internal_links_count == 0 {
        out.push(("dead_end_page".to_string(), json!({})));
    }

    if page.internal_links_count + page.external_links_count > HIGH_OUTBOUND_THRESHOLD {
        out.push((
            "high_outbound_links".to_string(),
            json!({ "count": page.internal_links_count + page.external_links_count }),
        ));
    }

    let is_orphan_candidate = page.internal_links_received == 0
        && page.page_depth != 0
        && (200..400).contains(&page.status_code);
    if is_orphan_candidate {
        match page.discovered_via {
            DiscoverySource::Sitemap => {
                out.push(("sitemap_only_page".to_string(), json!({})));
            }
            DiscoverySource::Seed => {}
            DiscoverySource::Crawl => {
                out.push(("orphan_page".to_string(), json!({})));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn page_at(depth: u32, discovered_via: DiscoverySource, internal_links_received: u32) -> PageRecord {
        let mut p = PageRecord::minimal(
            Uuid::new_v4(),
            "https://ex.test/x".to_string(),
            200,
            Some("text/html".to_string()),
            100,
            "ok",
            depth,
            discovered_via,
        );
        p.is_indexable = true;
        p.indexability_reason = None;
        p.internal_links_received = internal_links_received;
        p
    }

    #[test]
    fn sitemap_discovered_orphan_is_notice_not_warning() {
        let page = page_at(1, DiscoverySource::Sitemap, 0);
        let issues = detect(&page);
        assert!(issues.iter().any(|(c, _)| c == "sitemap_only_page"));
        assert!(!issues.iter().any(|(c, _)| c == "orphan_page"));
    }

    #[test]
    fn crawl_discovered_orphan_is_a_warning() {
        let page = page_at(2, DiscoverySource::Crawl, 0);
        let issues = detect(&page);
        assert!(issues.iter().any(|(c, _)| c == "orphan_page"));
    }

    #[test]
    fn seed_page_is_never_an_orphan() {
        let page = page_at(0, DiscoverySource::Seed, 0);
        let issues = detect(&page);
        assert!(!issues.iter().any(|(c, _)| c == "orphan_page" || c == "sitemap_only_page"));
    }

    #[test]
    fn flags_depth_buckets() {
        let page = page_at(5, DiscoverySource::Crawl, 1);
        assert!(detect(&page).iter().any(|(c, _)| c == "page_too_deep"));

        let page = page_at(8, DiscoverySource::Crawl, 1);
        assert!(detect(&page).iter().any(|(c, _)| c == "page_very_deep"));
    }

    #[test]
    fn flags_dead_end_pages() {
        let mut page = page_at(1, DiscoverySource::Crawl, 1);
        page.internal_links_count = 0;
        assert!(detect(&page).iter().any(|(c, _)| c == "dead_end_page"));
    }
}
