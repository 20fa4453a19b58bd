//! CrawlJob, Project, CrawlSettings and frontier-local types (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Lifecycle state of a `CrawlJob`. See spec.md §4.9 for the allowed transitions:
/// `pending -> processing -> (completed | failed | cancelled)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Stable site under audit. Read-only to the core (owned externally).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    /// Host without a leading `www.`.
    pub domain: String,
    pub settings: CrawlSettings,
}

/// Carry-over block on a new job listing URLs its predecessor already fetched
/// (spec.md GLOSSARY: "Resume info"). Those URLs are admitted pre-visited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeInfo {
    pub resumed_from: Uuid,
    pub skip_urls: Vec<String>,
    pub original_pages_crawled: u32,
    pub original_pages_discovered: u32,
}

/// Policy for one crawl job (spec.md §3, §6 "Crawl policy knobs").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSettings {
    pub max_pages: u32,
    pub max_depth: u32,
    /// Lower bound, in milliseconds, for the politeness delay between fetches.
    pub crawl_delay_ms: u64,
    pub respect_robots_txt: bool,
    pub follow_subdomains: bool,
    /// Selects `networkidle` (true) vs `domcontentloaded` (false) as the wait
    /// condition for headless navigation.
    pub render_javascript: bool,
    pub user_agent: String,
    /// Substring list; empty accepts all URLs.
    pub include_patterns: Vec<String>,
    /// Substring list; any match rejects a URL.
    pub exclude_patterns: Vec<String>,
    pub resume_info: Option<ResumeInfo>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: 500,
            max_depth: 5,
            crawl_delay_ms: 500,
            respect_robots_txt: true,
            follow_subdomains: false,
            render_javascript: true,
            user_agent: "AuditCrawlBot/1.0 (+https://auditcrawl.example/bot)".to_string(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            resume_info: None,
        }
    }
}

/// One audit run for one `Project` (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJob {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: JobStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub settings: CrawlSettings,
    pub status_message: Option<String>,

    // Monotonic counters (spec.md §3 invariant: non-decreasing during a run).
    pub pages_discovered: u32,
    pub pages_crawled: u32,
    pub pages_failed: u32,

    pub progress_percentage: f32,
    pub current_url: Option<String>,

    // Finalize aggregates (spec.md §6).
    pub health_score: Option<u32>,
    pub total_issues: u32,
    pub errors_count: u32,
    pub warnings_count: u32,
    pub notices_count: u32,
    pub passed_count: u32,
    pub category_scores: HashMap<String, u32>,
}

impl CrawlJob {
    pub fn new(project_id: Uuid, settings: CrawlSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            status: JobStatus::Pending,
            started_at: None,
            completed_at: None,
            settings,
            status_message: None,
            pages_discovered: 0,
            pages_crawled: 0,
            pages_failed: 0,
            progress_percentage: 0.0,
            current_url: None,
            health_score: None,
            total_issues: 0,
            errors_count: 0,
            warnings_count: 0,
            notices_count: 0,
            passed_count: 0,
            category_scores: HashMap::new(),
        }
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        let start = self.started_at?;
        let end = self.completed_at.unwrap_or_else(Utc::now);
        Some((end - start).num_seconds().max(0))
    }

    /// Whether this job was itself created as a resume of another job.
    /// A resume job's `resume_info` is always set; the controller refuses to
    /// auto-resume a job that is itself a resume (spec.md §4.9, §7).
    pub fn is_resume(&self) -> bool {
        self.settings.resume_info.is_some()
    }
}

/// Tag recording how a URL entered the frontier (GLOSSARY: "Discovery source").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Seed,
    Sitemap,
    Crawl,
}

/// A URL awaiting fetch. Orchestrator-local; destroyed on dequeue.
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
    pub parent: Option<String>,
    pub source: DiscoverySource,
}
