//! Flat registry of pure `(PageRecord) -> [(code, details)]` rule families
//! (spec.md §9 design note: "prefer a flat registry of pure functions rather
//! than a class hierarchy").

pub mod content;
pub mod crawlability;
pub mod graph;
pub mod mobile;
pub mod performance;
pub mod structured_data;
pub mod technical;

use crate::catalogue::IssueCatalogue;
use auditcrawl_types::page::PageRecord;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Run every rule family over one page, then drop any code the catalogue
/// doesn't recognize (spec.md §9: the catalogue is the sole authority).
pub fn detect(page: &PageRecord, catalogue: &IssueCatalogue, now: DateTime<Utc>) -> Vec<(String, serde_json::Value)> {
    let mut raw = Vec::new();
    raw.extend(crawlability::detect(page));
    raw.extend(content::detect(page));
    raw.extend(performance::detect(page));
    raw.extend(mobile::detect(page));
    raw.extend(technical::detect(page));
    raw.extend(structured_data::detect(page, now));

    raw.into_iter()
        .filter(|(code, _)| {
            let known = catalogue.lookup(code).is_some();
            if !known {
                debug!(code, "dropping issue code with no catalogue entry");
            }
            known
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::issue::{IssueCategory, IssueDefinition, IssueSeverity};
    use auditcrawl_types::job::DiscoverySource;
    use uuid::Uuid;

    #[test]
    fn unknown_codes_are_dropped() {
        let page = PageRecord::minimal(
            Uuid::new_v4(),
            "https://ex.test/".to_string(),
            404,
            Some("text/html".to_string()),
            100,
            "ok",
            0,
            DiscoverySource::Seed,
        );
        let empty_catalogue = IssueCatalogue::from_definitions(Vec::new());
        let issues = detect(&page, &empty_catalogue, Utc::now());
        assert!(issues.is_empty());
    }

    #[test]
    fn known_code_passes_through() {
        let page = PageRecord::minimal(
            Uuid::new_v4(),
            "https://ex.test/".to_string(),
            404,
            Some("text/html".to_string()),
            100,
            "ok",
            0,
            DiscoverySource::Seed,
        );
        let catalogue = IssueCatalogue::from_definitions(vec![IssueDefinition {
            id: Uuid::new_v4(),
            code: "CRAWL_4XX_ERROR".to_string(),
            name: "4xx error".to_string(),
            category: IssueCategory::Crawlability,
            severity: IssueSeverity::Error,
            active: true,
        }]);
        let issues = detect(&page, &catalogue, Utc::now());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].0, "CRAWL_4XX_ERROR");
    }
}
