//! Job/result store port (spec.md §2 "Out of scope" collaborator; §6 "Job
//! notifications consumed").

use crate::errors::Result;
use crate::issue::{IssueAggregate, IssueDefinition, PageIssue};
use crate::job::{CrawlJob, Project};
use crate::page::PageRecord;
use async_trait::async_trait;
use uuid::Uuid;

/// A row-level change notification, modeled as an asynchronous stream
/// (spec.md §9: "a language-neutral implementation can substitute
/// short-interval polling with no change to the Controller's state machine").
#[derive(Debug, Clone)]
pub enum JobNotification {
    Inserted { job_id: Uuid },
    UpdatedToCancelled { job_id: Uuid },
    UpdatedToCompleted { job_id: Uuid },
}

/// The durable store the core issues typed operations against. An
/// implementation backs this with a relational database plus a
/// change-notification mechanism (spec.md §2).
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get_project(&self, project_id: Uuid) -> Result<Project>;

    async fn get_job(&self, job_id: Uuid) -> Result<CrawlJob>;
    async fn insert_job(&self, job: &CrawlJob) -> Result<()>;
    async fn update_job_status(
        &self,
        job_id: Uuid,
        status: crate::job::JobStatus,
        message: Option<String>,
    ) -> Result<()>;
    async fn update_job_progress(
        &self,
        job_id: Uuid,
        pages_discovered: u32,
        pages_crawled: u32,
        pages_failed: u32,
        current_url: Option<String>,
    ) -> Result<()>;
    /// Conditional finalize: only takes effect while the job is still
    /// `processing` (spec.md §9 open question — a user-written terminal
    /// status wins the race).
    async fn finalize_job(&self, job: &CrawlJob) -> Result<()>;

    /// Jobs `status=processing` with `started_at` older than `stale_after`
    /// seconds (spec.md §4.9 step 1, "Recover orphans").
    async fn find_stale_processing_jobs(&self, stale_after_secs: i64) -> Result<Vec<CrawlJob>>;
    /// Most recent `failed` jobs within `within_secs`, ordered newest first
    /// (spec.md §4.9 step 2, "Auto-resume").
    async fn find_recent_failed_jobs(
        &self,
        within_secs: i64,
        limit: u32,
    ) -> Result<Vec<CrawlJob>>;
    async fn has_active_job(&self, project_id: Uuid) -> Result<bool>;
    /// Oldest pending job, if any (spec.md §4.9 step 3, "Drain").
    async fn next_pending_job(&self) -> Result<Option<CrawlJob>>;
    /// URLs of pages already written for a job (used to build resume's
    /// `skip_urls`).
    async fn crawled_urls(&self, job_id: Uuid) -> Result<Vec<String>>;

    async fn load_issue_catalogue(&self) -> Result<Vec<IssueDefinition>>;

    async fn upsert_page(&self, page: &PageRecord) -> Result<Uuid>;
    async fn set_internal_links_received(&self, job_id: Uuid, url_hash: &str, count: u32)
        -> Result<()>;
    async fn indexable_pages(&self, job_id: Uuid) -> Result<Vec<PageRecord>>;

    async fn upsert_issue_aggregate(
        &self,
        job_id: Uuid,
        issue_definition_id: Uuid,
    ) -> Result<IssueAggregate>;
    async fn insert_page_issue(&self, page_issue: &PageIssue) -> Result<()>;

    /// Subscribe to row-level change notifications (spec.md §4.9 "Listen").
    async fn subscribe(&self) -> Result<tokio::sync::mpsc::Receiver<JobNotification>>;
}
