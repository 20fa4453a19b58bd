//! SQL-row <-> domain-type anti-corruption layer (grounded in
//! `riptide-persistence`'s `PostgresRepository` pattern, generalized here to
//! typed columns instead of a single JSONB blob per the spec's explicit
//! `PageRecord`/`CrawlJob` field lists).

use auditcrawl_types::errors::{CrawlError, Result};
use auditcrawl_types::issue::{IssueAggregate, IssueCategory, IssueDefinition, IssueSeverity};
use auditcrawl_types::job::{CrawlJob, CrawlSettings, DiscoverySource, JobStatus, Project};
use auditcrawl_types::page::{PageRecord, RedirectHop};
use auditcrawl_types::ports::extractor::HreflangTag;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub fn job_status_to_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::Processing => "processing",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
        JobStatus::Cancelled => "cancelled",
    }
}

fn job_status_from_str(s: &str) -> Result<JobStatus> {
    match s {
        "pending" => Ok(JobStatus::Pending),
        "processing" => Ok(JobStatus::Processing),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        "cancelled" => Ok(JobStatus::Cancelled),
        other => Err(CrawlError::Store(format!("unknown job status '{other}'"))),
    }
}

pub fn discovery_source_to_str(source: DiscoverySource) -> &'static str {
    match source {
        DiscoverySource::Seed => "seed",
        DiscoverySource::Sitemap => "sitemap",
        DiscoverySource::Crawl => "crawl",
    }
}

fn discovery_source_from_str(s: &str) -> Result<DiscoverySource> {
    match s {
        "seed" => Ok(DiscoverySource::Seed),
        "sitemap" => Ok(DiscoverySource::Sitemap),
        "crawl" => Ok(DiscoverySource::Crawl),
        other => Err(CrawlError::Store(format!("unknown discovery source '{other}'"))),
    }
}

pub fn issue_severity_to_str(severity: IssueSeverity) -> &'static str {
    match severity {
        IssueSeverity::Notice => "notice",
        IssueSeverity::Warning => "warning",
        IssueSeverity::Error => "error",
    }
}

fn issue_severity_from_str(s: &str) -> Result<IssueSeverity> {
    match s {
        "notice" => Ok(IssueSeverity::Notice),
        "warning" => Ok(IssueSeverity::Warning),
        "error" => Ok(IssueSeverity::Error),
        other => Err(CrawlError::Store(format!("unknown issue severity '{other}'"))),
    }
}

pub fn issue_category_to_str(category: IssueCategory) -> &'static str {
    match category {
        IssueCategory::Crawlability => "crawlability",
        IssueCategory::Indexability => "indexability",
        IssueCategory::Content => "content",
        IssueCategory::Performance => "performance",
        IssueCategory::Security => "security",
        IssueCategory::Images => "images",
        IssueCategory::StructuredData => "structured-data",
        IssueCategory::Mobile => "mobile",
        IssueCategory::International => "international",
        IssueCategory::Social => "social",
        IssueCategory::Accessibility => "accessibility",
        IssueCategory::AiSearch => "ai-search",
        IssueCategory::TechnicalSeo => "technical-seo",
        IssueCategory::Ecommerce => "ecommerce",
        IssueCategory::Article => "article",
    }
}

fn issue_category_from_str(s: &str) -> Result<IssueCategory> {
    Ok(match s {
        "crawlability" => IssueCategory::Crawlability,
        "indexability" => IssueCategory::Indexability,
        "content" => IssueCategory::Content,
        "performance" => IssueCategory::Performance,
        "security" => IssueCategory::Security,
        "images" => IssueCategory::Images,
        "structured-data" => IssueCategory::StructuredData,
        "mobile" => IssueCategory::Mobile,
        "international" => IssueCategory::International,
        "social" => IssueCategory::Social,
        "accessibility" => IssueCategory::Accessibility,
        "ai-search" => IssueCategory::AiSearch,
        "technical-seo" => IssueCategory::TechnicalSeo,
        "ecommerce" => IssueCategory::Ecommerce,
        "article" => IssueCategory::Article,
        other => return Err(CrawlError::Store(format!("unknown issue category '{other}'"))),
    })
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub domain: String,
    pub settings: serde_json::Value,
}

impl TryFrom<ProjectRow> for Project {
    type Error = CrawlError;

    fn try_from(row: ProjectRow) -> Result<Self> {
        let settings: CrawlSettings = serde_json::from_value(row.settings)
            .map_err(|e| CrawlError::Store(format!("bad project settings JSON: {e}")))?;
        Ok(Project {
            id: row.id,
            domain: row.domain,
            settings,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct CrawlJobRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub settings: serde_json::Value,
    pub status_message: Option<String>,
    pub pages_discovered: i32,
    pub pages_crawled: i32,
    pub pages_failed: i32,
    pub progress_percentage: f32,
    pub current_url: Option<String>,
    pub health_score: Option<i32>,
    pub total_issues: i32,
    pub errors_count: i32,
    pub warnings_count: i32,
    pub notices_count: i32,
    pub passed_count: i32,
    pub category_scores: serde_json::Value,
}

impl TryFrom<CrawlJobRow> for CrawlJob {
    type Error = CrawlError;

    fn try_from(row: CrawlJobRow) -> Result<Self> {
        let settings: CrawlSettings = serde_json::from_value(row.settings)
            .map_err(|e| CrawlError::Store(format!("bad crawl job settings JSON: {e}")))?;
        let category_scores = serde_json::from_value(row.category_scores)
            .map_err(|e| CrawlError::Store(format!("bad category_scores JSON: {e}")))?;
        Ok(CrawlJob {
            id: row.id,
            project_id: row.project_id,
            status: job_status_from_str(&row.status)?,
            started_at: row.started_at,
            completed_at: row.completed_at,
            settings,
            status_message: row.status_message,
            pages_discovered: row.pages_discovered.max(0) as u32,
            pages_crawled: row.pages_crawled.max(0) as u32,
            pages_failed: row.pages_failed.max(0) as u32,
            progress_percentage: row.progress_percentage,
            current_url: row.current_url,
            health_score: row.health_score.map(|v| v.max(0) as u32),
            total_issues: row.total_issues.max(0) as u32,
            errors_count: row.errors_count.max(0) as u32,
            warnings_count: row.warnings_count.max(0) as u32,
            notices_count: row.notices_count.max(0) as u32,
            passed_count: row.passed_count.max(0) as u32,
            category_scores,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PageRow {
    pub id: Uuid,
    pub crawl_id: Uuid,
    pub url: String,
    pub url_hash: String,
    pub path: String,
    pub query_string: String,
    pub status_code: i32,
    pub redirect_url: Option<String>,
    pub redirect_chain: serde_json::Value,
    pub content_type: Option<String>,
    pub response_time_ms: i64,
    pub page_size_bytes: i64,
    pub word_count: i32,
    pub page_depth: i32,
    pub title: Option<String>,
    pub title_length: Option<i32>,
    pub meta_description: Option<String>,
    pub meta_description_length: Option<i32>,
    pub canonical_url: Option<String>,
    pub is_self_canonical: Option<bool>,
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub h1_count: i32,
    pub h2_count: i32,
    pub heading_tag_order: Vec<String>,
    pub robots_meta: Option<String>,
    pub is_indexable: bool,
    pub indexability_reason: Option<String>,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub internal_links_count: i32,
    pub external_links_count: i32,
    pub internal_links_received: i32,
    pub broken_links: Vec<String>,
    pub images_count: i32,
    pub images_without_alt: i32,
    pub images_with_empty_alt: i32,
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
    pub hreflang_tags: serde_json::Value,
    pub content_hash: String,
    pub body_text: String,
    pub discovered_via: String,
    pub parse_warnings: Vec<String>,
    pub analysis: serde_json::Value,
}

impl TryFrom<PageRow> for PageRecord {
    type Error = CrawlError;

    fn try_from(row: PageRow) -> Result<Self> {
        let redirect_chain: Vec<RedirectHop> = serde_json::from_value(row.redirect_chain)
            .map_err(|e| CrawlError::Store(format!("bad redirect_chain JSON: {e}")))?;
        let hreflang_tags: Vec<HreflangTag> = serde_json::from_value(row.hreflang_tags)
            .map_err(|e| CrawlError::Store(format!("bad hreflang_tags JSON: {e}")))?;
        Ok(PageRecord {
            id: Some(row.id),
            crawl_id: row.crawl_id,
            url: row.url,
            url_hash: row.url_hash,
            path: row.path,
            query_string: row.query_string,
            status_code: row.status_code.clamp(0, u16::MAX as i32) as u16,
            redirect_url: row.redirect_url,
            redirect_chain,
            content_type: row.content_type,
            response_time_ms: row.response_time_ms.max(0) as u64,
            page_size_bytes: row.page_size_bytes.max(0) as u64,
            word_count: row.word_count.max(0) as u32,
            page_depth: row.page_depth.max(0) as u32,
            title: row.title,
            title_length: row.title_length.map(|v| v.max(0) as u32),
            meta_description: row.meta_description,
            meta_description_length: row.meta_description_length.map(|v| v.max(0) as u32),
            canonical_url: row.canonical_url,
            is_self_canonical: row.is_self_canonical,
            h1_tags: row.h1_tags,
            h2_tags: row.h2_tags,
            h1_count: row.h1_count.max(0) as u32,
            h2_count: row.h2_count.max(0) as u32,
            heading_tag_order: row.heading_tag_order,
            robots_meta: row.robots_meta,
            is_indexable: row.is_indexable,
            indexability_reason: row.indexability_reason,
            internal_links: row.internal_links,
            external_links: row.external_links,
            internal_links_count: row.internal_links_count.max(0) as u32,
            external_links_count: row.external_links_count.max(0) as u32,
            internal_links_received: row.internal_links_received.max(0) as u32,
            broken_links: row.broken_links,
            images_count: row.images_count.max(0) as u32,
            images_without_alt: row.images_without_alt.max(0) as u32,
            images_with_empty_alt: row.images_with_empty_alt.max(0) as u32,
            lcp_ms: row.lcp_ms,
            fcp_ms: row.fcp_ms,
            ttfb_ms: row.ttfb_ms,
            cls_score: row.cls_score,
            inp_ms: row.inp_ms,
            is_mobile_friendly: row.is_mobile_friendly,
            viewport_configured: row.viewport_configured,
            schema_types: row.schema_types,
            has_schema: row.has_schema,
            og_title: row.og_title,
            og_description: row.og_description,
            og_image: row.og_image,
            twitter_card: row.twitter_card,
            is_https: row.is_https,
            has_mixed_content: row.has_mixed_content,
            html_lang: row.html_lang,
            hreflang_tags,
            content_hash: row.content_hash,
            body_text: row.body_text,
            discovered_via: discovery_source_from_str(&row.discovered_via)?,
            parse_warnings: row.parse_warnings,
            analysis: row.analysis,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct IssueDefinitionRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: String,
    pub severity: String,
    pub active: bool,
}

impl TryFrom<IssueDefinitionRow> for IssueDefinition {
    type Error = CrawlError;

    fn try_from(row: IssueDefinitionRow) -> Result<Self> {
        Ok(IssueDefinition {
            id: row.id,
            code: row.code,
            name: row.name,
            category: issue_category_from_str(&row.category)?,
            severity: issue_severity_from_str(&row.severity)?,
            active: row.active,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct IssueAggregateRow {
    pub id: Uuid,
    pub crawl_id: Uuid,
    pub issue_definition_id: Uuid,
    pub code: String,
    pub affected_pages_count: i32,
}

impl From<IssueAggregateRow> for IssueAggregate {
    fn from(row: IssueAggregateRow) -> Self {
        IssueAggregate {
            id: Some(row.id),
            crawl_id: row.crawl_id,
            issue_definition_id: row.issue_definition_id,
            code: row.code,
            affected_pages_count: row.affected_pages_count.max(0) as u32,
        }
    }
}
