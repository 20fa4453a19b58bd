//! Issue catalogue and aggregation types (spec.md §3, §4.6).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Notice,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    Crawlability,
    Indexability,
    Content,
    Performance,
    Security,
    Images,
    StructuredData,
    Mobile,
    International,
    Social,
    Accessibility,
    AiSearch,
    TechnicalSeo,
    Ecommerce,
    Article,
}

/// Catalogue entry, loaded once per job. `code` is the authoritative key: the
/// detector drops any emitted tuple whose code has no matching *active* entry
/// here (spec.md §9 open question).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDefinition {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: IssueCategory,
    pub severity: IssueSeverity,
    pub active: bool,
}

/// Per-job, per-code roll-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueAggregate {
    pub id: Option<Uuid>,
    pub crawl_id: Uuid,
    pub issue_definition_id: Uuid,
    pub code: String,
    pub affected_pages_count: u32,
}

/// Link from a page to an `IssueAggregate`, with JSON details.
/// Duplicates of `(page, aggregate)` are silently dropped (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageIssue {
    pub id: Option<Uuid>,
    pub crawl_id: Uuid,
    pub page_id: Uuid,
    pub issue_aggregate_id: Uuid,
    pub details: serde_json::Value,
}

/// Summed counts by severity and category, plus the derived category score
/// (spec.md §4.6 "Counts", §4.8 step 4 health score).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueCounts {
    pub total: u32,
    pub errors: u32,
    pub warnings: u32,
    pub notices: u32,
    pub passed: u32,
    pub by_category: std::collections::HashMap<String, CategoryCount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryCount {
    pub errors: u32,
    pub warnings: u32,
    pub notices: u32,
    pub score: u32,
}

/// `max(0, min(100, 100 - 5*errors - 2*warnings - floor(0.5*notices)))`, used
/// both per-category (spec.md §4.6) and site-wide (spec.md §4.8 step 4, health
/// score) — the same formula at two granularities.
pub fn score(errors: u32, warnings: u32, notices: u32) -> u32 {
    let raw = 100i64 - 5 * errors as i64 - 2 * warnings as i64 - (notices as i64) / 2;
    raw.clamp(0, 100) as u32
}
