//! # AuditCrawl Issues
//!
//! The rule-driven issue detector (spec.md §4.6): a pure function over a
//! [`PageRecord`] and the loaded issue-definition catalogue, plus the
//! severity/category roll-up used for per-job health scoring.

pub mod catalogue;
pub mod rules;

pub use catalogue::IssueCatalogue;

use auditcrawl_types::issue::{IssueCategory, IssueCounts, IssueSeverity};
use auditcrawl_types::page::PageRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Detect issues for one page against the job's catalogue.
pub fn detect_page(page: &PageRecord, catalogue: &IssueCatalogue, now: DateTime<Utc>) -> Vec<(String, serde_json::Value)> {
    rules::detect(page, catalogue, now)
}

/// Detect the post-crawl graph-level issues for one already-flushed page
/// (spec.md §4.8 steps 2-3: depth/dead-end/orphan/sitemap-only), filtered
/// through the same catalogue authority as [`detect_page`].
pub fn detect_graph_issues(page: &PageRecord, catalogue: &IssueCatalogue) -> Vec<(String, serde_json::Value)> {
    rules::graph::detect(page)
        .into_iter()
        .filter(|(code, _)| catalogue.lookup(code).is_some())
        .collect()
}

/// Fold every `(page, code)` detection across a job into severity and
/// category counts (spec.md §4.6 "Counts").
#[derive(Debug, Default, Clone)]
pub struct IssueTally {
    pub counts: IssueCounts,
    pub by_category: HashMap<IssueCategory, (u32, u32, u32)>, // (errors, warnings, notices)
}

impl IssueTally {
    pub fn record(&mut self, catalogue: &IssueCatalogue, code: &str) {
        let Some(def) = catalogue.lookup(code) else {
            return;
        };

        match def.severity {
            IssueSeverity::Error => self.counts.errors += 1,
            IssueSeverity::Warning => self.counts.warnings += 1,
            IssueSeverity::Notice => self.counts.notices += 1,
        }
        self.counts.total += 1;

        let entry = self.by_category.entry(def.category).or_insert((0, 0, 0));
        match def.severity {
            IssueSeverity::Error => entry.0 += 1,
            IssueSeverity::Warning => entry.1 += 1,
            IssueSeverity::Notice => entry.2 += 1,
        }
    }

    /// Per-category score using the same clamped formula as the site-wide
    /// health score (spec.md §4.6 "category score").
    pub fn category_scores(&self) -> HashMap<IssueCategory, u32> {
        self.by_category
            .iter()
            .map(|(cat, (e, w, n))| (*cat, auditcrawl_types::issue::score(*e, *w, *n)))
            .collect()
    }

    pub fn health_score(&self) -> u32 {
        auditcrawl_types::issue::score(self.counts.errors, self.counts.warnings, self.counts.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::issue::IssueDefinition;
    use uuid::Uuid;

    fn def(code: &str, category: IssueCategory, severity: IssueSeverity) -> IssueDefinition {
        IssueDefinition {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_string(),
            category,
            severity,
            active: true,
        }
    }

    #[test]
    fn tally_accumulates_severity_and_category_counts() {
        let catalogue = IssueCatalogue::from_definitions(vec![
            def("CRAWL_4XX_ERROR", IssueCategory::Crawlability, IssueSeverity::Error),
            def("mobile_missing_viewport", IssueCategory::Mobile, IssueSeverity::Warning),
        ]);

        let mut tally = IssueTally::default();
        tally.record(&catalogue, "CRAWL_4XX_ERROR");
        tally.record(&catalogue, "mobile_missing_viewport");
        tally.record(&catalogue, "UNKNOWN_CODE");

        assert_eq!(tally.counts.errors, 1);
        assert_eq!(tally.counts.warnings, 1);
        assert_eq!(tally.counts.total, 2);
        assert_eq!(tally.health_score(), 100 - 5 - 2);
    }
}
