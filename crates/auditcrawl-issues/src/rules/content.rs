//! Content family (spec.md §4.6): title/description length, heading
//! structure, thinness, keyword stuffing, reading level, title/body overlap.

use auditcrawl_types::page::PageRecord;
use serde_json::json;

fn max_hierarchy_skip(tag_order: &[String]) -> u32 {
    let levels: Vec<u32> = tag_order
        .iter()
        .filter_map(|t| t.strip_prefix('h').and_then(|n| n.parse().ok()))
        .collect();
    levels.windows(2).map(|w| w[1].saturating_sub(w[0])).max().unwrap_or(0)
}

pub fn detect(page: &PageRecord) -> Vec<(String, serde_json::Value)> {
    let mut out = Vec::new();

    match &page.title {
        None => out.push(("CONTENT_MISSING_TITLE".to_string(), json!({}))),
        Some(title) => {
            let len = title.chars().count();
            if len < 30 {
                out.push(("CONTENT_TITLE_TOO_SHORT".to_string(), json!({ "length": len })));
            } else if len > 60 {
                out.push(("CONTENT_TITLE_TOO_LONG".to_string(), json!({ "length": len })));
            }
        }
    }

    match &page.meta_description {
        None => out.push(("CONTENT_MISSING_META_DESCRIPTION".to_string(), json!({}))),
        Some(desc) => {
            let len = desc.chars().count();
            if len < 70 {
                out.push(("CONTENT_META_DESCRIPTION_TOO_SHORT".to_string(), json!({ "length": len })));
            } else if len > 160 {
                out.push(("CONTENT_META_DESCRIPTION_TOO_LONG".to_string(), json!({ "length": len })));
            }
        }
    }

    if page.h1_count == 0 {
        out.push(("CONTENT_MISSING_H1".to_string(), json!({})));
    } else if page.h1_count > 1 {
        out.push(("CONTENT_MULTIPLE_H1".to_string(), json!({ "count": page.h1_count })));
    }

    if page.word_count == 0 {
        out.push(("CONTENT_NO_BODY".to_string(), json!({})));
    } else if page.word_count < 100 {
        out.push(("CONTENT_VERY_THIN".to_string(), json!({ "word_count": page.word_count })));
    } else if page.word_count < 300 {
        out.push(("CONTENT_LOW_WORD_COUNT".to_string(), json!({ "word_count": page.word_count })));
    }

    if let Some(densities) = page.analysis.get("keyword_density").and_then(|v| v.as_array()) {
        if densities.iter().any(|d| d.get("density").and_then(|v| v.as_f64()).unwrap_or(0.0) > 3.0) {
            out.push(("CONTENT_KEYWORD_STUFFING".to_string(), json!({})));
        }
    }

    if page.word_count >= 50 {
        if let Some(ratio) = page.analysis.get("text_to_html_ratio").and_then(|v| v.as_f64()) {
            if ratio < 0.10 {
                out.push(("CONTENT_LOW_TEXT_TO_HTML_RATIO".to_string(), json!({ "ratio": ratio })));
            }
        }
    }

    if let Some(reading) = page.analysis.get("reading_level") {
        let grade = reading.get("grade").and_then(|v| v.as_f64()).unwrap_or(0.0);
        let bucket = reading.get("bucket").and_then(|v| v.as_str()).unwrap_or("");
        if grade > 16.0 && bucket.eq_ignore_ascii_case("complex") {
            out.push(("CONTENT_READING_LEVEL_TOO_COMPLEX".to_string(), json!({ "grade": grade })));
        }
    }

    let skip = max_hierarchy_skip(&page.heading_tag_order);
    if skip > 1 {
        out.push(("CONTENT_HEADING_HIERARCHY_SKIP".to_string(), json!({ "skip": skip })));
    }

    if let Some(title) = &page.title {
        let title_words: Vec<String> = title
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| w.chars().count() >= 4)
            .collect();
        if !title_words.is_empty() {
            let body_lower = page.body_text.to_lowercase();
            let missing = title_words.iter().all(|w| !body_lower.contains(w.as_str()));
            if missing {
                out.push((
                    "CONTENT_TITLE_KEYWORDS_MISSING_FROM_BODY".to_string(),
                    json!({ "title_words": title_words }),
                ));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::job::DiscoverySource;
    use uuid::Uuid;

    fn page_with(title: Option<&str>, desc: Option<&str>, h1_count: u32, word_count: u32) -> PageRecord {
        let mut p = PageRecord::minimal(
            Uuid::new_v4(),
            "https://ex.test/".to_string(),
            200,
            Some("text/html".to_string()),
            100,
            "ok",
            0,
            DiscoverySource::Seed,
        );
        p.title = title.map(|s| s.to_string());
        p.meta_description = desc.map(|s| s.to_string());
        p.h1_count = h1_count;
        p.word_count = word_count;
        p.is_indexable = true;
        p.indexability_reason = None;
        p
    }

    #[test]
    fn flags_missing_title_and_h1() {
        let page = page_with(None, Some(&"x".repeat(100)), 0, 500);
        let issues = detect(&page);
        assert!(issues.iter().any(|(c, _)| c == "CONTENT_MISSING_TITLE"));
        assert!(issues.iter().any(|(c, _)| c == "CONTENT_MISSING_H1"));
    }

    #[test]
    fn well_formed_page_passes_content_checks() {
        let title = "A".repeat(45);
        let desc = "B".repeat(120);
        let page = page_with(Some(&title), Some(&desc), 1, 800);
        let issues = detect(&page);
        assert!(issues.is_empty());
    }
}
