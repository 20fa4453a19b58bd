//! # AuditCrawl Store
//!
//! PostgreSQL-backed [`JobStore`] adapter (spec.md §2, §6): typed-column
//! repositories over `projects`/`crawl_jobs`/`page_records`/`issue_aggregates`/
//! `page_issues`, plus a `LISTEN/NOTIFY`-driven change stream.
//!
//! Grounded in `riptide-persistence`'s `PostgresRepository` for the runtime
//! `sqlx::query_as` idiom (`#[instrument]`, `tracing::{debug,error}`, `Arc<PgPool>`)
//! but diverges from its generic JSONB-blob-per-row pattern: this spec's
//! `PageRecord`/`CrawlJob` have an explicit typed field list, so every scalar
//! and simple array gets its own column and JSONB is reserved for the
//! genuinely nested/variant fields. `subscribe()` has no teacher counterpart —
//! riptide's workers poll a Redis queue rather than listening on Postgres — so
//! it is built directly from `sqlx::postgres::PgListener`.

pub mod rows;

use auditcrawl_types::errors::{CrawlError, Result};
use auditcrawl_types::issue::{IssueAggregate, IssueDefinition, PageIssue};
use auditcrawl_types::job::{CrawlJob, JobStatus, Project};
use auditcrawl_types::page::PageRecord;
use auditcrawl_types::ports::job_store::{JobNotification, JobStore};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgListener, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use rows::{
    discovery_source_to_str, issue_category_to_str, issue_severity_to_str, job_status_to_str,
    CrawlJobRow, IssueAggregateRow, IssueDefinitionRow, PageRow, ProjectRow,
};

/// Open a connection pool against `job_store_url` (a DSN without embedded
/// credentials) using `job_store_credential` as the password (spec.md §6:
/// "Two required: the job-store base URL and a service credential").
pub async fn connect(job_store_url: &str, job_store_credential: &str) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(job_store_url)
        .map_err(|e| CrawlError::Store(format!("invalid job store URL: {e}")))?
        .password(job_store_credential);

    PgPoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .map_err(|e| CrawlError::Store(format!("failed to connect to job store: {e}")))
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| CrawlError::Store(format!("migration failed: {e}")))
}

/// Postgres-backed [`JobStore`].
pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    #[instrument(skip(self))]
    async fn get_project(&self, project_id: Uuid) -> Result<Project> {
        let row: ProjectRow = sqlx::query_as("SELECT id, domain, settings FROM projects WHERE id = $1")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CrawlError::Store(format!("get_project: {e}")))?;
        row.try_into()
    }

    #[instrument(skip(self))]
    async fn get_job(&self, job_id: Uuid) -> Result<CrawlJob> {
        let row: CrawlJobRow = sqlx::query_as(CRAWL_JOB_SELECT_CLAUSE)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CrawlError::Store(format!("get_job: {e}")))?
            .ok_or(CrawlError::JobNotFound { job_id })?;
        row.try_into()
    }

    #[instrument(skip(self, job))]
    async fn insert_job(&self, job: &CrawlJob) -> Result<()> {
        let settings = serde_json::to_value(&job.settings)
            .map_err(|e| CrawlError::Store(format!("serialize settings: {e}")))?;
        sqlx::query(
            "INSERT INTO crawl_jobs (id, project_id, status, settings)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(job.id)
        .bind(job.project_id)
        .bind(job_status_to_str(job.status))
        .bind(settings)
        .execute(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("insert_job: {e}")))?;
        debug!(job_id = %job.id, "inserted crawl job");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_job_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        message: Option<String>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE crawl_jobs SET
                status = $2,
                status_message = $3,
                started_at = CASE WHEN $2 = 'processing' AND started_at IS NULL THEN now() ELSE started_at END,
                completed_at = CASE WHEN $2 IN ('completed', 'failed', 'cancelled') THEN now() ELSE completed_at END
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(job_status_to_str(status))
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("update_job_status: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_job_progress(
        &self,
        job_id: Uuid,
        pages_discovered: u32,
        pages_crawled: u32,
        pages_failed: u32,
        current_url: Option<String>,
    ) -> Result<()> {
        let progress = if pages_discovered > 0 {
            (pages_crawled as f32 / pages_discovered as f32 * 100.0).min(100.0)
        } else {
            0.0
        };
        sqlx::query(
            "UPDATE crawl_jobs SET
                pages_discovered = $2,
                pages_crawled = $3,
                pages_failed = $4,
                current_url = $5,
                progress_percentage = $6
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(pages_discovered as i32)
        .bind(pages_crawled as i32)
        .bind(pages_failed as i32)
        .bind(current_url)
        .bind(progress)
        .execute(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("update_job_progress: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self, job))]
    async fn finalize_job(&self, job: &CrawlJob) -> Result<()> {
        let category_scores = serde_json::to_value(&job.category_scores)
            .map_err(|e| CrawlError::Store(format!("serialize category_scores: {e}")))?;
        let result = sqlx::query(
            "UPDATE crawl_jobs SET
                status = $2,
                completed_at = now(),
                status_message = $3,
                health_score = $4,
                total_issues = $5,
                errors_count = $6,
                warnings_count = $7,
                notices_count = $8,
                passed_count = $9,
                category_scores = $10
             WHERE id = $1 AND status = 'processing'",
        )
        .bind(job.id)
        .bind(job_status_to_str(job.status))
        .bind(&job.status_message)
        .bind(job.health_score.map(|v| v as i32))
        .bind(job.total_issues as i32)
        .bind(job.errors_count as i32)
        .bind(job.warnings_count as i32)
        .bind(job.notices_count as i32)
        .bind(job.passed_count as i32)
        .bind(category_scores)
        .execute(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("finalize_job: {e}")))?;

        if result.rows_affected() == 0 {
            warn!(job_id = %job.id, "finalize_job no-op: job already left the processing state");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_stale_processing_jobs(&self, stale_after_secs: i64) -> Result<Vec<CrawlJob>> {
        let rows: Vec<CrawlJobRow> = sqlx::query_as(&format!(
            "{CRAWL_JOB_SELECT_CLAUSE_PREFIX} WHERE status = 'processing'
             AND started_at < now() - ($1::bigint * interval '1 second')"
        ))
        .bind(stale_after_secs)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("find_stale_processing_jobs: {e}")))?;
        rows.into_iter().map(CrawlJob::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_recent_failed_jobs(&self, within_secs: i64, limit: u32) -> Result<Vec<CrawlJob>> {
        let rows: Vec<CrawlJobRow> = sqlx::query_as(&format!(
            "{CRAWL_JOB_SELECT_CLAUSE_PREFIX} WHERE status = 'failed'
             AND completed_at > now() - ($1::bigint * interval '1 second')
             ORDER BY completed_at DESC
             LIMIT $2"
        ))
        .bind(within_secs)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("find_recent_failed_jobs: {e}")))?;
        rows.into_iter().map(CrawlJob::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn has_active_job(&self, project_id: Uuid) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM crawl_jobs WHERE project_id = $1 AND status IN ('pending', 'processing'))",
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("has_active_job: {e}")))?;
        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn next_pending_job(&self) -> Result<Option<CrawlJob>> {
        let row: Option<CrawlJobRow> = sqlx::query_as(&format!(
            "{CRAWL_JOB_SELECT_CLAUSE_PREFIX} WHERE status = 'pending' ORDER BY created_at ASC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("next_pending_job: {e}")))?;
        row.map(CrawlJob::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn crawled_urls(&self, job_id: Uuid) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT url FROM page_records WHERE crawl_id = $1")
            .bind(job_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CrawlError::Store(format!("crawled_urls: {e}")))?;
        Ok(rows.into_iter().map(|(url,)| url).collect())
    }

    #[instrument(skip(self))]
    async fn load_issue_catalogue(&self) -> Result<Vec<IssueDefinition>> {
        let rows: Vec<IssueDefinitionRow> =
            sqlx::query_as("SELECT id, code, name, category, severity, active FROM issue_definitions ORDER BY code")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| CrawlError::Store(format!("load_issue_catalogue: {e}")))?;
        rows.into_iter().map(IssueDefinition::try_from).collect()
    }

    #[instrument(skip(self, page), fields(url = %page.url))]
    async fn upsert_page(&self, page: &PageRecord) -> Result<Uuid> {
        let redirect_chain = serde_json::to_value(&page.redirect_chain)
            .map_err(|e| CrawlError::Store(format!("serialize redirect_chain: {e}")))?;
        let hreflang_tags = serde_json::to_value(&page.hreflang_tags)
            .map_err(|e| CrawlError::Store(format!("serialize hreflang_tags: {e}")))?;

        let (id,): (Uuid,) = sqlx::query_as(PAGE_UPSERT_SQL)
            .bind(page.crawl_id)
            .bind(&page.url)
            .bind(&page.url_hash)
            .bind(&page.path)
            .bind(&page.query_string)
            .bind(page.status_code as i32)
            .bind(&page.redirect_url)
            .bind(redirect_chain)
            .bind(&page.content_type)
            .bind(page.response_time_ms as i64)
            .bind(page.page_size_bytes as i64)
            .bind(page.word_count as i32)
            .bind(page.page_depth as i32)
            .bind(&page.title)
            .bind(page.title_length.map(|v| v as i32))
            .bind(&page.meta_description)
            .bind(page.meta_description_length.map(|v| v as i32))
            .bind(&page.canonical_url)
            .bind(page.is_self_canonical)
            .bind(&page.h1_tags)
            .bind(&page.h2_tags)
            .bind(page.h1_count as i32)
            .bind(page.h2_count as i32)
            .bind(&page.heading_tag_order)
            .bind(&page.robots_meta)
            .bind(page.is_indexable)
            .bind(&page.indexability_reason)
            .bind(&page.internal_links)
            .bind(&page.external_links)
            .bind(page.internal_links_count as i32)
            .bind(page.external_links_count as i32)
            .bind(page.internal_links_received as i32)
            .bind(&page.broken_links)
            .bind(page.images_count as i32)
            .bind(page.images_without_alt as i32)
            .bind(page.images_with_empty_alt as i32)
            .bind(page.lcp_ms)
            .bind(page.fcp_ms)
            .bind(page.ttfb_ms)
            .bind(page.cls_score)
            .bind(page.inp_ms)
            .bind(page.is_mobile_friendly)
            .bind(page.viewport_configured)
            .bind(&page.schema_types)
            .bind(page.has_schema)
            .bind(&page.og_title)
            .bind(&page.og_description)
            .bind(&page.og_image)
            .bind(&page.twitter_card)
            .bind(page.is_https)
            .bind(page.has_mixed_content)
            .bind(&page.html_lang)
            .bind(hreflang_tags)
            .bind(&page.content_hash)
            .bind(&page.body_text)
            .bind(discovery_source_to_str(page.discovered_via))
            .bind(&page.parse_warnings)
            .bind(&page.analysis)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CrawlError::Store(format!("upsert_page: {e}")))?;
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn set_internal_links_received(&self, job_id: Uuid, url_hash: &str, count: u32) -> Result<()> {
        sqlx::query("UPDATE page_records SET internal_links_received = $3 WHERE crawl_id = $1 AND url_hash = $2")
            .bind(job_id)
            .bind(url_hash)
            .bind(count as i32)
            .execute(&self.pool)
            .await
            .map_err(|e| CrawlError::Store(format!("set_internal_links_received: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn indexable_pages(&self, job_id: Uuid) -> Result<Vec<PageRecord>> {
        let rows: Vec<PageRow> = sqlx::query_as(&format!(
            "{PAGE_SELECT_CLAUSE_PREFIX} WHERE crawl_id = $1 AND is_indexable = true"
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("indexable_pages: {e}")))?;
        rows.into_iter().map(PageRecord::try_from).collect()
    }

    /// Ensures the per-job-per-code aggregate row exists, without bumping its
    /// count. `affected_pages_count` is only incremented from
    /// `insert_page_issue` once a `(page, issue)` link is actually new, so
    /// double-detecting the same page never inflates it past the number of
    /// distinct affected pages (spec.md P10).
    #[instrument(skip(self))]
    async fn upsert_issue_aggregate(&self, crawl_id: Uuid, issue_definition_id: Uuid) -> Result<IssueAggregate> {
        let row: IssueAggregateRow = sqlx::query_as(
            "INSERT INTO issue_aggregates (crawl_id, issue_definition_id, code, affected_pages_count)
             VALUES ($1, $2, (SELECT code FROM issue_definitions WHERE id = $2), 0)
             ON CONFLICT (crawl_id, issue_definition_id)
             DO UPDATE SET code = issue_aggregates.code
             RETURNING id, crawl_id, issue_definition_id, code, affected_pages_count",
        )
        .bind(crawl_id)
        .bind(issue_definition_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("upsert_issue_aggregate: {e}")))?;
        Ok(row.into())
    }

    /// Inserts the page/issue link, absorbing duplicates via the
    /// `(page_id, issue_aggregate_id)` uniqueness constraint (spec.md §5
    /// "Shared resource policy"), and bumps the aggregate's
    /// `affected_pages_count` only when the link is genuinely new — gating
    /// the increment on `rows_affected() > 0` keeps it decoupled from
    /// re-detection of the same page (spec.md P10).
    #[instrument(skip(self, page_issue))]
    async fn insert_page_issue(&self, page_issue: &PageIssue) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO page_issues (crawl_id, page_id, issue_aggregate_id, details)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (page_id, issue_aggregate_id) DO NOTHING",
        )
        .bind(page_issue.crawl_id)
        .bind(page_issue.page_id)
        .bind(page_issue.issue_aggregate_id)
        .bind(&page_issue.details)
        .execute(&self.pool)
        .await
        .map_err(|e| CrawlError::Store(format!("insert_page_issue: {e}")))?;

        if result.rows_affected() > 0 {
            sqlx::query(
                "UPDATE issue_aggregates SET affected_pages_count = affected_pages_count + 1 WHERE id = $1",
            )
            .bind(page_issue.issue_aggregate_id)
            .execute(&self.pool)
            .await
            .map_err(|e| CrawlError::Store(format!("insert_page_issue: count increment: {e}")))?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn subscribe(&self) -> Result<tokio::sync::mpsc::Receiver<JobNotification>> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| CrawlError::Store(format!("subscribe: failed to start listener: {e}")))?;
        listener
            .listen("job_changes")
            .await
            .map_err(|e| CrawlError::Store(format!("subscribe: LISTEN failed: {e}")))?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        if let Some(event) = parse_notification(notification.payload()) {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "job_changes listener error; stopping notification stream");
                        break;
                    }
                }
            }
        });
        Ok(rx)
    }
}

fn parse_notification(payload: &str) -> Option<JobNotification> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    let event = value.get("event")?.as_str()?;
    let job_id: Uuid = value.get("job_id")?.as_str()?.parse().ok()?;
    match event {
        "inserted" => Some(JobNotification::Inserted { job_id }),
        "updated_to_cancelled" => Some(JobNotification::UpdatedToCancelled { job_id }),
        "updated_to_completed" => Some(JobNotification::UpdatedToCompleted { job_id }),
        _ => None,
    }
}

const CRAWL_JOB_SELECT_CLAUSE_PREFIX: &str = "SELECT
    id, project_id, status, started_at, completed_at, settings, status_message,
    pages_discovered, pages_crawled, pages_failed, progress_percentage, current_url,
    health_score, total_issues, errors_count, warnings_count, notices_count, passed_count,
    category_scores
    FROM crawl_jobs";

const CRAWL_JOB_SELECT_CLAUSE: &str = "SELECT
    id, project_id, status, started_at, completed_at, settings, status_message,
    pages_discovered, pages_crawled, pages_failed, progress_percentage, current_url,
    health_score, total_issues, errors_count, warnings_count, notices_count, passed_count,
    category_scores
    FROM crawl_jobs WHERE id = $1";

const PAGE_SELECT_CLAUSE_PREFIX: &str = "SELECT
    id, crawl_id, url, url_hash, path, query_string, status_code, redirect_url, redirect_chain,
    content_type, response_time_ms, page_size_bytes, word_count, page_depth, title, title_length,
    meta_description, meta_description_length, canonical_url, is_self_canonical, h1_tags, h2_tags,
    h1_count, h2_count, heading_tag_order, robots_meta, is_indexable, indexability_reason,
    internal_links, external_links, internal_links_count, external_links_count,
    internal_links_received, broken_links, images_count, images_without_alt, images_with_empty_alt,
    lcp_ms, fcp_ms, ttfb_ms, cls_score, inp_ms, is_mobile_friendly, viewport_configured,
    schema_types, has_schema, og_title, og_description, og_image, twitter_card, is_https,
    has_mixed_content, html_lang, hreflang_tags, content_hash, body_text, discovered_via,
    parse_warnings, analysis
    FROM page_records";

const PAGE_UPSERT_SQL: &str = "INSERT INTO page_records (
    crawl_id, url, url_hash, path, query_string, status_code, redirect_url, redirect_chain,
    content_type, response_time_ms, page_size_bytes, word_count, page_depth, title, title_length,
    meta_description, meta_description_length, canonical_url, is_self_canonical, h1_tags, h2_tags,
    h1_count, h2_count, heading_tag_order, robots_meta, is_indexable, indexability_reason,
    internal_links, external_links, internal_links_count, external_links_count,
    internal_links_received, broken_links, images_count, images_without_alt, images_with_empty_alt,
    lcp_ms, fcp_ms, ttfb_ms, cls_score, inp_ms, is_mobile_friendly, viewport_configured,
    schema_types, has_schema, og_title, og_description, og_image, twitter_card, is_https,
    has_mixed_content, html_lang, hreflang_tags, content_hash, body_text, discovered_via,
    parse_warnings, analysis
) VALUES (
    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21,
    $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34, $35, $36, $37, $38, $39, $40,
    $41, $42, $43, $44, $45, $46, $47, $48, $49, $50, $51, $52, $53, $54, $55, $56, $57, $58
)
ON CONFLICT (crawl_id, url_hash) DO UPDATE SET
    path = EXCLUDED.path, query_string = EXCLUDED.query_string, status_code = EXCLUDED.status_code,
    redirect_url = EXCLUDED.redirect_url, redirect_chain = EXCLUDED.redirect_chain,
    content_type = EXCLUDED.content_type, response_time_ms = EXCLUDED.response_time_ms,
    page_size_bytes = EXCLUDED.page_size_bytes, word_count = EXCLUDED.word_count,
    page_depth = EXCLUDED.page_depth, title = EXCLUDED.title, title_length = EXCLUDED.title_length,
    meta_description = EXCLUDED.meta_description,
    meta_description_length = EXCLUDED.meta_description_length,
    canonical_url = EXCLUDED.canonical_url, is_self_canonical = EXCLUDED.is_self_canonical,
    h1_tags = EXCLUDED.h1_tags, h2_tags = EXCLUDED.h2_tags, h1_count = EXCLUDED.h1_count,
    h2_count = EXCLUDED.h2_count, heading_tag_order = EXCLUDED.heading_tag_order,
    robots_meta = EXCLUDED.robots_meta, is_indexable = EXCLUDED.is_indexable,
    indexability_reason = EXCLUDED.indexability_reason, internal_links = EXCLUDED.internal_links,
    external_links = EXCLUDED.external_links, internal_links_count = EXCLUDED.internal_links_count,
    external_links_count = EXCLUDED.external_links_count,
    internal_links_received = EXCLUDED.internal_links_received, broken_links = EXCLUDED.broken_links,
    images_count = EXCLUDED.images_count, images_without_alt = EXCLUDED.images_without_alt,
    images_with_empty_alt = EXCLUDED.images_with_empty_alt, lcp_ms = EXCLUDED.lcp_ms,
    fcp_ms = EXCLUDED.fcp_ms, ttfb_ms = EXCLUDED.ttfb_ms, cls_score = EXCLUDED.cls_score,
    inp_ms = EXCLUDED.inp_ms, is_mobile_friendly = EXCLUDED.is_mobile_friendly,
    viewport_configured = EXCLUDED.viewport_configured, schema_types = EXCLUDED.schema_types,
    has_schema = EXCLUDED.has_schema, og_title = EXCLUDED.og_title,
    og_description = EXCLUDED.og_description, og_image = EXCLUDED.og_image,
    twitter_card = EXCLUDED.twitter_card, is_https = EXCLUDED.is_https,
    has_mixed_content = EXCLUDED.has_mixed_content, html_lang = EXCLUDED.html_lang,
    hreflang_tags = EXCLUDED.hreflang_tags, content_hash = EXCLUDED.content_hash,
    body_text = EXCLUDED.body_text, discovered_via = EXCLUDED.discovered_via,
    parse_warnings = EXCLUDED.parse_warnings, analysis = EXCLUDED.analysis
RETURNING id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_notification_events() {
        let payload = r#"{"event":"inserted","job_id":"3fa85f64-5717-4562-b3fc-2c963f66afa6"}"#;
        assert!(matches!(parse_notification(payload), Some(JobNotification::Inserted { .. })));
    }

    #[test]
    fn ignores_unknown_events() {
        let payload = r#"{"event":"something_else","job_id":"3fa85f64-5717-4562-b3fc-2c963f66afa6"}"#;
        assert!(parse_notification(payload).is_none());
    }

    #[test]
    fn status_round_trips_through_its_string_form() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            let s = job_status_to_str(status);
            assert!(!s.is_empty());
        }
    }

    #[test]
    fn severity_and_category_labels_are_non_empty() {
        use auditcrawl_types::issue::{IssueCategory, IssueSeverity};
        assert_eq!(issue_severity_to_str(IssueSeverity::Error), "error");
        assert_eq!(issue_category_to_str(IssueCategory::AiSearch), "ai-search");
    }
}
