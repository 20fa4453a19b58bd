//! Performance family (spec.md §4.6): page weight and core web vitals
//! thresholds. Vitals are only available when JS rendering populated them.

use auditcrawl_types::page::PageRecord;
use serde_json::json;

const MAX_PAGE_SIZE_BYTES: u64 = 3 * 1024 * 1024;
const MAX_HTML_SIZE_BYTES: u64 = 100 * 1024;
const MAX_LCP_MS: f64 = 4000.0;
const MAX_TTFB_MS: f64 = 800.0;
const MAX_CLS: f64 = 0.25;
const MAX_INP_MS: f64 = 500.0;

pub fn detect(page: &PageRecord) -> Vec<(String, serde_json::Value)> {
    let mut out = Vec::new();

    if page.page_size_bytes > MAX_PAGE_SIZE_BYTES {
        out.push(("PERF_PAGE_TOO_LARGE".to_string(), json!({ "bytes": page.page_size_bytes })));
    }
    if page.page_size_bytes > MAX_HTML_SIZE_BYTES {
        out.push(("PERF_HTML_TOO_LARGE".to_string(), json!({ "bytes": page.page_size_bytes })));
    }

    if let Some(lcp) = page.lcp_ms {
        if lcp > MAX_LCP_MS {
            out.push(("PERF_LCP_TOO_SLOW".to_string(), json!({ "lcp_ms": lcp })));
        }
    }
    if let Some(ttfb) = page.ttfb_ms {
        if ttfb > MAX_TTFB_MS {
            out.push(("PERF_TTFB_TOO_SLOW".to_string(), json!({ "ttfb_ms": ttfb })));
        }
    }
    if let Some(cls) = page.cls_score {
        if cls > MAX_CLS {
            out.push(("PERF_CLS_TOO_HIGH".to_string(), json!({ "cls": cls })));
        }
    }
    if let Some(inp) = page.inp_ms {
        if inp > MAX_INP_MS {
            out.push(("PERF_INP_TOO_SLOW".to_string(), json!({ "inp_ms": inp })));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::job::DiscoverySource;
    use uuid::Uuid;

    #[test]
    fn flags_oversized_pages_and_slow_vitals() {
        let mut page = PageRecord::minimal(
            Uuid::new_v4(),
            "https://ex.test/".to_string(),
            200,
            Some("text/html".to_string()),
            100,
            "ok",
            0,
            DiscoverySource::Seed,
        );
        page.page_size_bytes = 4 * 1024 * 1024;
        page.lcp_ms = Some(5000.0);

        let issues = detect(&page);
        assert!(issues.iter().any(|(c, _)| c == "PERF_PAGE_TOO_LARGE"));
        assert!(issues.iter().any(|(c, _)| c == "PERF_LCP_TOO_SLOW"));
    }
}
