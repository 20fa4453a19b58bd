//! # AuditCrawl Spider
//!
//! The crawl orchestrator (spec.md §4.7: frontier, admission, BFS run loop)
//! and the post-crawl analyzer (spec.md §4.8: orphans, depth outliers,
//! health score, AI-search scoring).

pub mod frontier;
pub mod normalize;
pub mod orchestrator;
pub mod post_crawl;

pub use orchestrator::{CancelToken, Orchestrator, RunOutcome};
pub use post_crawl::PostCrawlAnalyzer;

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use auditcrawl_types::errors::Result;
    use auditcrawl_types::issue::{IssueAggregate, IssueDefinition, PageIssue};
    use auditcrawl_types::job::{CrawlJob, JobStatus, Project};
    use auditcrawl_types::page::PageRecord;
    use auditcrawl_types::ports::job_store::{JobNotification, JobStore};
    use uuid::Uuid;

    /// A `JobStore` that accepts every write and returns empty reads, used
    /// where orchestrator tests only exercise admission/BFS logic and never
    /// actually need persisted state back.
    pub struct NullJobStore;

    #[async_trait]
    impl JobStore for NullJobStore {
        async fn get_project(&self, project_id: Uuid) -> Result<Project> {
            Ok(Project {
                id: project_id,
                domain: "ex.test".to_string(),
                settings: Default::default(),
            })
        }

        async fn get_job(&self, job_id: Uuid) -> Result<CrawlJob> {
            Ok(CrawlJob::new(job_id, Default::default()))
        }

        async fn insert_job(&self, _job: &CrawlJob) -> Result<()> {
            Ok(())
        }

        async fn update_job_status(&self, _job_id: Uuid, _status: JobStatus, _message: Option<String>) -> Result<()> {
            Ok(())
        }

        async fn update_job_progress(
            &self,
            _job_id: Uuid,
            _pages_discovered: u32,
            _pages_crawled: u32,
            _pages_failed: u32,
            _current_url: Option<String>,
        ) -> Result<()> {
            Ok(())
        }

        async fn finalize_job(&self, _job: &CrawlJob) -> Result<()> {
            Ok(())
        }

        async fn find_stale_processing_jobs(&self, _stale_after_secs: i64) -> Result<Vec<CrawlJob>> {
            Ok(Vec::new())
        }

        async fn find_recent_failed_jobs(&self, _within_secs: i64, _limit: u32) -> Result<Vec<CrawlJob>> {
            Ok(Vec::new())
        }

        async fn has_active_job(&self, _project_id: Uuid) -> Result<bool> {
            Ok(false)
        }

        async fn next_pending_job(&self) -> Result<Option<CrawlJob>> {
            Ok(None)
        }

        async fn crawled_urls(&self, _job_id: Uuid) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn load_issue_catalogue(&self) -> Result<Vec<IssueDefinition>> {
            Ok(Vec::new())
        }

        async fn upsert_page(&self, _page: &PageRecord) -> Result<Uuid> {
            Ok(Uuid::new_v4())
        }

        async fn set_internal_links_received(&self, _job_id: Uuid, _url_hash: &str, _count: u32) -> Result<()> {
            Ok(())
        }

        async fn indexable_pages(&self, _job_id: Uuid) -> Result<Vec<PageRecord>> {
            Ok(Vec::new())
        }

        async fn upsert_issue_aggregate(&self, crawl_id: Uuid, issue_definition_id: Uuid) -> Result<IssueAggregate> {
            Ok(IssueAggregate {
                id: Some(Uuid::new_v4()),
                crawl_id,
                issue_definition_id,
                code: String::new(),
                affected_pages_count: 1,
            })
        }

        async fn insert_page_issue(&self, _page_issue: &PageIssue) -> Result<()> {
            Ok(())
        }

        async fn subscribe(&self) -> Result<tokio::sync::mpsc::Receiver<JobNotification>> {
            let (_tx, rx) = tokio::sync::mpsc::channel(1);
            Ok(rx)
        }
    }
}
