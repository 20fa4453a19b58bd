//! Technical-SEO family (spec.md §4.6): URL parameter hygiene and canonical
//! presence on indexable pages.

use auditcrawl_types::page::PageRecord;
use serde_json::json;

const SORT_OR_SESSION_PARAM_KEYS: &[&str] = &["sort", "order", "sessionid", "sid", "filter"];

fn query_params(query_string: &str) -> Vec<(String, String)> {
    query_string
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| {
            let mut parts = p.splitn(2, '=');
            let key = parts.next().unwrap_or_default().to_lowercase();
            let value = parts.next().unwrap_or_default().to_string();
            (key, value)
        })
        .collect()
}

pub fn detect(page: &PageRecord) -> Vec<(String, serde_json::Value)> {
    let mut out = Vec::new();

    let params = query_params(&page.query_string);
    if params.len() >= 3 {
        out.push((
            "excessive_url_parameters".to_string(),
            json!({ "count": params.len() }),
        ));
    }

    if params
        .iter()
        .any(|(k, _)| SORT_OR_SESSION_PARAM_KEYS.contains(&k.as_str()))
    {
        out.push(("technical_sorting_or_session_params".to_string(), json!({})));
    }

    if page.is_indexable && page.status_code == 200 && page.canonical_url.is_none() {
        out.push(("technical_missing_canonical_on_indexable_page".to_string(), json!({})));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::job::DiscoverySource;
    use uuid::Uuid;

    #[test]
    fn flags_excessive_query_parameters() {
        let mut page = PageRecord::minimal(
            Uuid::new_v4(),
            "https://ex.test/?a=1&b=2&c=3".to_string(),
            200,
            Some("text/html".to_string()),
            100,
            "ok",
            0,
            DiscoverySource::Seed,
        );
        page.query_string = "a=1&b=2&c=3".to_string();
        page.is_indexable = true;
        let issues = detect(&page);
        assert!(issues.iter().any(|(c, _)| c == "excessive_url_parameters"));
    }

    #[test]
    fn flags_missing_canonical_on_indexable_page() {
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
        page.is_indexable = true;
        page.canonical_url = None;
        let issues = detect(&page);
        assert!(issues
            .iter()
            .any(|(c, _)| c == "technical_missing_canonical_on_indexable_page"));
    }
}
