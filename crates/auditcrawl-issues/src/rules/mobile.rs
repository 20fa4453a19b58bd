//! Mobile family (spec.md §4.6), read from the `mobile` sub-object of
//! `PageRecord::analysis` produced by the extractor.

use auditcrawl_types::page::PageRecord;
use serde_json::json;

pub fn detect(page: &PageRecord) -> Vec<(String, serde_json::Value)> {
    let mut out = Vec::new();
    let Some(mobile) = page.analysis.get("mobile") else {
        return out;
    };

    let bool_field = |field: &str| mobile.get(field).and_then(|v| v.as_bool()).unwrap_or(false);
    let u64_field = |field: &str| mobile.get(field).and_then(|v| v.as_u64()).unwrap_or(0);

    if !bool_field("has_viewport") {
        out.push(("mobile_missing_viewport".to_string(), json!({})));
    }
    if bool_field("viewport_disables_zoom") {
        out.push(("mobile_zoom_disabled".to_string(), json!({})));
    }
    if u64_field("unresponsive_image_count") > 0 {
        out.push((
            "mobile_images_not_responsive".to_string(),
            json!({ "count": u64_field("unresponsive_image_count") }),
        ));
    }
    if u64_field("unresponsive_table_count") > 0 {
        out.push((
            "mobile_tables_not_responsive".to_string(),
            json!({ "count": u64_field("unresponsive_table_count") }),
        ));
    }
    if bool_field("has_fixed_position_elements") {
        out.push(("mobile_fixed_elements".to_string(), json!({})));
    }
    if !bool_field("has_media_queries") {
        out.push(("mobile_no_media_queries".to_string(), json!({})));
    }
    if u64_field("phone_numbers_not_linked") > 0 {
        out.push((
            "mobile_phone_not_linked".to_string(),
            json!({ "count": u64_field("phone_numbers_not_linked") }),
        ));
    }
    if u64_field("lazy_loaded_above_fold_images") > 0 {
        out.push(("mobile_lcp_lazy_loaded".to_string(), json!({})));
    }

    if page.viewport_configured == Some(false) {
        out.push(("mobile_missing_viewport_meta".to_string(), json!({})));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::job::DiscoverySource;
    use serde_json::json as j;
    use uuid::Uuid;

    #[test]
    fn flags_missing_viewport_from_analysis_blob() {
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
        page.analysis = j!({ "mobile": { "has_viewport": false } });
        let issues = detect(&page);
        assert!(issues.iter().any(|(c, _)| c == "mobile_missing_viewport"));
    }
}
