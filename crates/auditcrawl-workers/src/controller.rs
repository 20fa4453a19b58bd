//! Job Lifecycle Controller (spec.md §4.9): listens for job-store change
//! notifications, reconciles orphaned/failed jobs at start-up, and runs at
//! most one crawl at a time, cooperatively cancelling it on an external
//! status flip or on worker shutdown.

use std::sync::Arc;
use std::time::Duration;

use auditcrawl_browser::headless::HeadlessEngine;
use auditcrawl_browser::static_http;
use auditcrawl_config::WorkerConfig;
use auditcrawl_fetch::PageFetcher;
use auditcrawl_issues::IssueCatalogue;
use auditcrawl_spider::orchestrator::{CancelToken, Orchestrator, RunOutcome};
use auditcrawl_spider::post_crawl::PostCrawlAnalyzer;
use auditcrawl_types::errors::Result;
use auditcrawl_types::job::{CrawlJob, CrawlSettings, JobStatus, ResumeInfo};
use auditcrawl_types::ports::browser::BrowserEngine;
use auditcrawl_types::ports::job_store::{JobNotification, JobStore};
use auditcrawl_types::ports::oracle::PerformanceOracle;
use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Jobs with `pages_crawled` at or below this count are not worth
/// auto-resuming (spec.md §4.9 step 2: "`pages_crawled > 10`").
const AUTO_RESUME_MIN_PAGES_CRAWLED: u32 = 10;
/// Auto-resume only looks at jobs that failed within the last hour
/// (spec.md §4.9 step 2).
const AUTO_RESUME_WINDOW_SECS: i64 = 3600;
/// Auto-resume considers at most this many recent failures per pass
/// (spec.md §4.9 step 2: "up to 5 most recent jobs").
const AUTO_RESUME_LIMIT: u32 = 5;

struct ActiveJob {
    job_id: Uuid,
    cancel: CancelToken,
    handle: tokio::task::JoinHandle<()>,
}

pub struct JobController {
    job_store: Arc<dyn JobStore>,
    catalogue: IssueCatalogue,
    oracle: Option<Arc<dyn PerformanceOracle>>,
    http: reqwest::Client,
    config: WorkerConfig,
    active: Arc<Mutex<Option<ActiveJob>>>,
}

impl JobController {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        catalogue: IssueCatalogue,
        oracle: Option<Arc<dyn PerformanceOracle>>,
        http: reqwest::Client,
        config: WorkerConfig,
    ) -> Self {
        Self { job_store, catalogue, oracle, http, config, active: Arc::new(Mutex::new(None)) }
    }

    /// Run the controller until `shutdown` fires. On shutdown, the in-flight
    /// job (if any) is cancelled and marked `failed` (spec.md §5
    /// "Cancellation & timeouts").
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.reconcile_orphans().await;
        self.auto_resume().await;
        self.drain_if_idle().await;

        let mut notifications = self.job_store.subscribe().await?;
        let mut poll_backstop = tokio::time::interval(Duration::from_secs(self.config.poll_backstop_secs));
        let mut resume_backstop = tokio::time::interval(Duration::from_secs(self.config.resume_backstop_secs));
        poll_backstop.tick().await;
        resume_backstop.tick().await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.shutdown().await;
                        return Ok(());
                    }
                }
                note = notifications.recv() => {
                    match note {
                        Some(note) => self.handle_notification(note).await,
                        None => {
                            warn!("job-store notification channel closed; falling back to poll backstop only");
                            return Ok(());
                        }
                    }
                }
                _ = poll_backstop.tick() => {
                    self.drain_if_idle().await;
                }
                _ = resume_backstop.tick() => {
                    self.auto_resume().await;
                    self.drain_if_idle().await;
                }
            }
        }
    }

    async fn handle_notification(&self, note: JobNotification) {
        match note {
            JobNotification::Inserted { job_id } => {
                info!(%job_id, "new pending job notified");
                self.drain_if_idle().await;
            }
            JobNotification::UpdatedToCancelled { job_id } | JobNotification::UpdatedToCompleted { job_id } => {
                let active = self.active.lock().await;
                if let Some(active) = active.as_ref() {
                    if active.job_id == job_id {
                        info!(%job_id, "active job's status flipped externally; cancelling crawl");
                        active.cancel.cancel();
                    }
                }
            }
        }
    }

    /// Start-up reconciliation step 1: "Recover orphans" (spec.md §4.9).
    #[instrument(skip(self))]
    async fn reconcile_orphans(&self) {
        let stale = match self.job_store.find_stale_processing_jobs(self.config.stale_job_secs).await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "failed to look up stale processing jobs");
                return;
            }
        };
        for job in stale {
            info!(job_id = %job.id, "recovering orphaned job to pending");
            if let Err(e) = self
                .job_store
                .update_job_status(job.id, JobStatus::Pending, Some("recovered after worker restart".to_string()))
                .await
            {
                error!(job_id = %job.id, error = %e, "failed to recover orphaned job");
            }
        }
    }

    /// Start-up reconciliation step 2 and the 5-minute backstop: "Auto-resume"
    /// (spec.md §4.9).
    #[instrument(skip(self))]
    async fn auto_resume(&self) {
        let failed = match self
            .job_store
            .find_recent_failed_jobs(AUTO_RESUME_WINDOW_SECS, AUTO_RESUME_LIMIT)
            .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "failed to look up recently failed jobs");
                return;
            }
        };

        for failed_job in failed {
            if failed_job.is_resume() || failed_job.pages_crawled <= AUTO_RESUME_MIN_PAGES_CRAWLED {
                continue;
            }
            match self.job_store.has_active_job(failed_job.project_id).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    error!(job_id = %failed_job.id, error = %e, "failed to check for an active job; skipping auto-resume");
                    continue;
                }
            }

            let skip_urls = match self.job_store.crawled_urls(failed_job.id).await {
                Ok(urls) => urls,
                Err(e) => {
                    error!(job_id = %failed_job.id, error = %e, "failed to read crawled urls; skipping auto-resume");
                    continue;
                }
            };

            let mut settings = failed_job.settings.clone();
            settings.resume_info = Some(ResumeInfo {
                resumed_from: failed_job.id,
                skip_urls,
                original_pages_crawled: failed_job.pages_crawled,
                original_pages_discovered: failed_job.pages_discovered,
            });

            let resume_job = CrawlJob::new(failed_job.project_id, settings);
            info!(resumed_from = %failed_job.id, resume_job_id = %resume_job.id, "auto-resuming failed job");
            if let Err(e) = self.job_store.insert_job(&resume_job).await {
                error!(job_id = %resume_job.id, error = %e, "failed to insert auto-resume job");
            }
        }
    }

    /// Start-up reconciliation step 3, also re-run by every backstop tick and
    /// every `Inserted` notification: "Drain" (spec.md §4.9). Single-flight:
    /// a no-op while a job is already active.
    async fn drain_if_idle(&self) {
        {
            let active = self.active.lock().await;
            if active.is_some() {
                return;
            }
        }

        let next = match self.job_store.next_pending_job().await {
            Ok(next) => next,
            Err(e) => {
                error!(error = %e, "failed to look up the next pending job");
                return;
            }
        };
        let Some(job) = next else { return };

        let mut active = self.active.lock().await;
        if active.is_some() {
            return;
        }

        let cancel = CancelToken::new();
        let job_id = job.id;
        let handle = {
            let execution = self.clone_for_task();
            let cancel = cancel.clone();
            let active_slot = self.active.clone();
            tokio::spawn(async move {
                execution.execute_job(job, cancel).await;
                let mut active = active_slot.lock().await;
                if matches!(active.as_ref(), Some(a) if a.job_id == job_id) {
                    *active = None;
                }
            })
        };
        *active = Some(ActiveJob { job_id, cancel, handle });
    }

    /// Borrows what a spawned job-execution task needs, as owned handles.
    fn clone_for_task(&self) -> JobExecution {
        JobExecution {
            job_store: self.job_store.clone(),
            catalogue: self.catalogue.clone(),
            oracle: self.oracle.clone(),
            http: self.http.clone(),
        }
    }

    /// Cancel an in-flight job and mark it `failed` (spec.md §5 "On shutdown
    /// signal, the controller cancels the in-flight job and marks it failed
    /// with 'Worker shutdown during crawl'").
    async fn shutdown(&self) {
        let active = self.active.lock().await.take();
        let Some(active) = active else { return };
        info!(job_id = %active.job_id, "shutdown requested; cancelling in-flight job");
        active.cancel.cancel();
        if let Err(e) = active.handle.await {
            error!(job_id = %active.job_id, error = %e, "job execution task panicked during shutdown");
        }
        if let Err(e) = self
            .job_store
            .update_job_status(active.job_id, JobStatus::Failed, Some("Worker shutdown during crawl".to_string()))
            .await
        {
            error!(job_id = %active.job_id, error = %e, "failed to mark shut-down job as failed");
        }
    }
}

/// The state one spawned job-execution task needs; split out of
/// [`JobController`] so `drain_if_idle` can hand it to `tokio::spawn` without
/// holding the controller's `active` lock for the job's whole lifetime.
struct JobExecution {
    job_store: Arc<dyn JobStore>,
    catalogue: IssueCatalogue,
    oracle: Option<Arc<dyn PerformanceOracle>>,
    http: reqwest::Client,
}

impl JobExecution {
    #[instrument(skip_all, fields(job_id = %job.id))]
    async fn execute_job(&self, mut job: CrawlJob, cancel: CancelToken) {
        let domain = match self.job_store.get_project(job.project_id).await {
            Ok(project) => project.domain,
            Err(e) => {
                error!(error = %e, "failed to load project for job; marking failed");
                let _ = self
                    .job_store
                    .update_job_status(job.id, JobStatus::Failed, Some(format!("project lookup failed: {e}")))
                    .await;
                return;
            }
        };

        job.started_at = Some(Utc::now());
        if let Err(e) = self.job_store.update_job_status(job.id, JobStatus::Processing, None).await {
            error!(error = %e, "failed to flip job to processing; aborting run");
            return;
        }

        let engine = match build_engine(&job.settings).await {
            Ok(engine) => engine,
            Err(e) => {
                error!(error = %e, "failed to start the browser engine; marking failed");
                let _ = self
                    .job_store
                    .update_job_status(job.id, JobStatus::Failed, Some(format!("browser engine error: {e}")))
                    .await;
                return;
            }
        };

        let fetcher = PageFetcher::new(engine, domain.clone());
        let mut orchestrator = Orchestrator::new(
            self.job_store.clone(),
            fetcher,
            self.http.clone(),
            self.catalogue.clone(),
            cancel,
        );

        let outcome = orchestrator.run(&mut job, &domain).await;
        if outcome == RunOutcome::Cancelled {
            info!("run cancelled; leaving terminal status to whoever wrote it (or to the shutdown handler)");
            return;
        }

        let Some(robots) = orchestrator.robots() else {
            warn!("run drained without ever fetching robots.txt; skipping post-crawl analysis");
            return;
        };

        let analyzer = PostCrawlAnalyzer::new(self.job_store.clone(), self.catalogue.clone(), self.oracle.clone(), self.http.clone());
        if let Err(e) = analyzer
            .run(&mut job, &domain, orchestrator.frontier().incoming_links(), robots, orchestrator.tally())
            .await
        {
            error!(error = %e, "post-crawl analysis failed; finalizing with what we have");
        }

        job.status = JobStatus::Completed;
        job.completed_at = Some(Utc::now());
        job.progress_percentage = 100.0;
        if let Err(e) = self.job_store.finalize_job(&job).await {
            error!(error = %e, "failed to finalize job");
        }
    }
}

/// Picks the real headless engine when JavaScript rendering is requested,
/// falling back to the static-HTML engine otherwise (spec.md §6 crawl-policy
/// knob `render_javascript`).
async fn build_engine(settings: &CrawlSettings) -> Result<Arc<dyn BrowserEngine>> {
    if settings.render_javascript {
        let engine = HeadlessEngine::launch(&settings.user_agent).await?;
        Ok(Arc::new(engine))
    } else {
        static_http::engine_for(&settings.user_agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::issue::{IssueAggregate, IssueDefinition, PageIssue};
    use auditcrawl_types::job::Project;
    use auditcrawl_types::page::PageRecord;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Records what the controller asked for and lets tests script the
    /// answers, without standing up a real database (spec.md §4.9 is a pure
    /// state machine over these calls).
    #[derive(Default)]
    struct FakeStore {
        stale: Vec<CrawlJob>,
        recent_failed: Vec<CrawlJob>,
        has_active: bool,
        pending: StdMutex<Vec<CrawlJob>>,
        inserted: StdMutex<Vec<CrawlJob>>,
        recovered_to_pending: StdMutex<Vec<Uuid>>,
        finalized: AtomicBool,
        drain_calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl JobStore for FakeStore {
        async fn get_project(&self, project_id: Uuid) -> Result<Project> {
            Ok(Project { id: project_id, domain: "ex.test".to_string(), settings: Default::default() })
        }
        async fn get_job(&self, job_id: Uuid) -> Result<CrawlJob> {
            Ok(CrawlJob::new(job_id, Default::default()))
        }
        async fn insert_job(&self, job: &CrawlJob) -> Result<()> {
            self.inserted.lock().unwrap().push(job.clone());
            Ok(())
        }
        async fn update_job_status(&self, job_id: Uuid, status: JobStatus, _message: Option<String>) -> Result<()> {
            if status == JobStatus::Pending {
                self.recovered_to_pending.lock().unwrap().push(job_id);
            }
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
            self.finalized.store(true, Ordering::SeqCst);
            Ok(())
        }
        async fn find_stale_processing_jobs(&self, _stale_after_secs: i64) -> Result<Vec<CrawlJob>> {
            Ok(self.stale.clone())
        }
        async fn find_recent_failed_jobs(&self, _within_secs: i64, _limit: u32) -> Result<Vec<CrawlJob>> {
            Ok(self.recent_failed.clone())
        }
        async fn has_active_job(&self, _project_id: Uuid) -> Result<bool> {
            Ok(self.has_active)
        }
        async fn next_pending_job(&self) -> Result<Option<CrawlJob>> {
            self.drain_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pending.lock().unwrap().pop())
        }
        async fn crawled_urls(&self, _job_id: Uuid) -> Result<Vec<String>> {
            Ok(vec!["https://ex.test/a".to_string()])
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
            Ok(IssueAggregate { id: Some(Uuid::new_v4()), crawl_id, issue_definition_id, code: String::new(), affected_pages_count: 1 })
        }
        async fn insert_page_issue(&self, _page_issue: &PageIssue) -> Result<()> {
            Ok(())
        }
        async fn subscribe(&self) -> Result<tokio::sync::mpsc::Receiver<JobNotification>> {
            let (_tx, rx) = tokio::sync::mpsc::channel(1);
            Ok(rx)
        }
    }

    fn failed_job(pages_crawled: u32, is_resume: bool) -> CrawlJob {
        let mut settings = auditcrawl_types::job::CrawlSettings::default();
        if is_resume {
            settings.resume_info = Some(ResumeInfo::default());
        }
        let mut job = CrawlJob::new(Uuid::new_v4(), settings);
        job.status = JobStatus::Failed;
        job.pages_crawled = pages_crawled;
        job
    }

    /// Builds a controller and hands back a typed handle to the same store
    /// so tests can inspect what it recorded, without downcasting the trait
    /// object the controller itself holds.
    fn controller(store: Arc<FakeStore>) -> JobController {
        JobController::new(
            store,
            IssueCatalogue::default(),
            None,
            reqwest::Client::new(),
            WorkerConfig {
                job_store_url: String::new(),
                job_store_credential: String::new(),
                performance_oracle_api_key: None,
                poll_backstop_secs: 30,
                resume_backstop_secs: 300,
                stale_job_secs: 300,
            },
        )
    }

    #[tokio::test]
    async fn reconcile_orphans_flips_stale_jobs_back_to_pending() {
        let stale_job = CrawlJob::new(Uuid::new_v4(), Default::default());
        let stale_id = stale_job.id;
        let store = Arc::new(FakeStore { stale: vec![stale_job], ..Default::default() });
        controller(store.clone()).reconcile_orphans().await;
        assert_eq!(*store.recovered_to_pending.lock().unwrap(), vec![stale_id]);
    }

    #[tokio::test]
    async fn auto_resume_skips_short_runs_and_resume_jobs_and_active_projects() {
        let store = Arc::new(FakeStore {
            recent_failed: vec![
                failed_job(5, false),  // too few pages crawled
                failed_job(50, true),  // already a resume
                failed_job(50, false), // eligible
            ],
            has_active: false,
            ..Default::default()
        });
        controller(store.clone()).auto_resume().await;
        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert!(inserted[0].is_resume());
        assert_eq!(inserted[0].settings.resume_info.as_ref().unwrap().original_pages_crawled, 50);
    }

    #[tokio::test]
    async fn auto_resume_skips_every_candidate_when_project_has_an_active_job() {
        let store = Arc::new(FakeStore {
            recent_failed: vec![failed_job(50, false)],
            has_active: true,
            ..Default::default()
        });
        controller(store.clone()).auto_resume().await;
        assert!(store.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn drain_if_idle_is_single_flight() {
        let mut settings = auditcrawl_types::job::CrawlSettings::default();
        settings.render_javascript = false;
        let job_a = CrawlJob::new(Uuid::new_v4(), settings);
        let store = Arc::new(FakeStore { pending: StdMutex::new(vec![job_a]), ..Default::default() });
        let ctl = controller(store.clone());

        ctl.drain_if_idle().await;
        assert!(ctl.active.lock().await.is_some());

        // A second drain while one job is already active must not look up
        // another pending job at all (single-flight).
        ctl.drain_if_idle().await;
        assert_eq!(store.drain_calls.load(Ordering::SeqCst), 1);
    }
}
