//! Crawl Orchestrator (spec.md §4.7): owns the frontier, visited set and
//! back-reference table; runs discovery -> fetch -> extract -> detect
//! serially under the delay budget; supports cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use auditcrawl_fetch::PageFetcher;
use auditcrawl_issues::{IssueCatalogue, IssueTally};
use auditcrawl_robots::RobotsPolicy;
use auditcrawl_sitemap::SitemapReader;
use auditcrawl_types::issue::PageIssue;
use auditcrawl_types::job::{CrawlJob, CrawlSettings, DiscoverySource};
use auditcrawl_types::ports::job_store::JobStore;
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::frontier::Frontier;
use crate::normalize::{is_seo_relevant, normalize, strip_www};

/// Shared cooperative-cancel flag (spec.md §5 "Cancellation & timeouts":
/// "`Cancel` is cooperative and checked at each loop iteration").
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of [`Orchestrator::run`]: whether the frontier drained naturally
/// or the run was cut short by cancellation (spec.md §4.8: the post-crawl
/// analyzer only runs "once the frontier is drained and not cancelled").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Drained,
    Cancelled,
}

pub struct Orchestrator {
    job_store: Arc<dyn JobStore>,
    fetcher: PageFetcher,
    http: reqwest::Client,
    catalogue: IssueCatalogue,
    frontier: Frontier,
    cancel: CancelToken,
    tally: IssueTally,
    robots: Option<RobotsPolicy>,
}

impl Orchestrator {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        fetcher: PageFetcher,
        http: reqwest::Client,
        catalogue: IssueCatalogue,
        cancel: CancelToken,
    ) -> Self {
        Self {
            job_store,
            fetcher,
            http,
            catalogue,
            frontier: Frontier::new(),
            cancel,
            tally: IssueTally::default(),
            robots: None,
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Per-page issue counts accumulated over the run so far. The post-crawl
    /// analyzer continues folding graph-level issues into a clone of this
    /// before computing the final health score (spec.md §4.8 step 3).
    pub fn tally(&self) -> IssueTally {
        self.tally.clone()
    }

    /// The robots policy fetched at the start of [`Orchestrator::run`], if a
    /// run has completed. Consumed by the post-crawl analyzer (spec.md §4.8).
    pub fn robots(&self) -> Option<&RobotsPolicy> {
        self.robots.as_ref()
    }

    /// `Admit(url, depth, parent, source)` (spec.md §4.7). Returns the
    /// normalized URL on success.
    fn admit(
        &mut self,
        url: &str,
        depth: u32,
        domain: &str,
        settings: &CrawlSettings,
        robots: Option<&RobotsPolicy>,
    ) -> Option<String> {
        let normalized = normalize(url)?;

        if self.frontier.is_visited(&normalized) || self.frontier.is_discovered(&normalized) {
            return None;
        }
        if depth > settings.max_depth {
            return None;
        }
        if self.frontier.discovered_count() >= settings.max_pages as usize {
            return None;
        }
        if settings.respect_robots_txt {
            if let Some(robots) = robots {
                if !robots.is_allowed(&normalized) {
                    return None;
                }
            }
        }
        if !settings.include_patterns.is_empty()
            && !settings.include_patterns.iter().any(|p| normalized.contains(p.as_str()))
        {
            return None;
        }
        if settings.exclude_patterns.iter().any(|p| normalized.contains(p.as_str())) {
            return None;
        }

        let parsed = url::Url::parse(&normalized).ok()?;
        let host = parsed.host_str()?;
        let same_domain = strip_www(host).eq_ignore_ascii_case(strip_www(domain));
        let is_subdomain = settings.follow_subdomains
            && strip_www(host).to_lowercase().ends_with(&format!(".{}", strip_www(domain).to_lowercase()));
        if !same_domain && !is_subdomain {
            return None;
        }

        if is_seo_relevant(&normalized).is_err() {
            return None;
        }

        Some(normalized)
    }

    fn admit_and_push(
        &mut self,
        url: &str,
        depth: u32,
        parent: Option<String>,
        source: DiscoverySource,
        domain: &str,
        settings: &CrawlSettings,
        robots: Option<&RobotsPolicy>,
    ) -> bool {
        match self.admit(url, depth, domain, settings, robots) {
            Some(normalized) => {
                self.frontier.push(normalized, depth, parent, source);
                true
            }
            None => false,
        }
    }

    /// Run the discovery -> fetch -> extract -> detect loop until the
    /// frontier drains or cancellation is observed (spec.md §4.7 "Run loop").
    #[instrument(skip_all, fields(job_id = %job.id, domain))]
    pub async fn run(&mut self, job: &mut CrawlJob, domain: &str) -> RunOutcome {
        let settings = job.settings.clone();

        if let Some(resume) = settings.resume_info.clone() {
            self.frontier.preload_visited(resume.skip_urls.iter().cloned());
            job.pages_discovered = job.pages_discovered.max(resume.original_pages_discovered);
        }

        let seed_url = format!("https://{domain}/");
        if let Some(normalized) = normalize(&seed_url) {
            self.frontier.push(normalized, 0, None, DiscoverySource::Seed);
        }

        let robots = RobotsPolicy::fetch(&self.http, domain, &settings.user_agent).await;
        self.robots = Some(robots.clone());
        let sitemap_reader = SitemapReader::new(self.http.clone(), settings.user_agent.clone(), settings.max_pages as usize);
        let sitemap_entries = sitemap_reader.read_all(domain, robots.sitemaps()).await;
        for entry in &sitemap_entries {
            self.admit_and_push(&entry.loc, 1, None, DiscoverySource::Sitemap, domain, &settings, Some(&robots));
        }

        let effective_delay_ms = robots.crawl_delay_ms().unwrap_or(0).max(settings.crawl_delay_ms);

        loop {
            if self.cancel.is_cancelled() {
                info!("cancellation observed, exiting run loop before finalization");
                return RunOutcome::Cancelled;
            }
            let Some(entry) = self.frontier.pop() else {
                break;
            };

            job.pages_discovered = self.frontier.discovered_count() as u32;

            let page = self
                .fetcher
                .crawl(job.id, &entry.url, entry.depth, entry.source, settings.render_javascript)
                .await;

            // A fetch "failed" only when the engine never got a response at all
            // (spec.md §7 item 2: error-shaped records carry `status=0`); a page
            // that was fetched but is merely non-indexable (noindex, redirect,
            // non-HTML) still counts toward `pages_crawled` (spec.md §3 "Job
            // counters").
            if page.status_code == 0 {
                job.pages_failed += 1;
            } else {
                job.pages_crawled += 1;
            }

            let page_id = match self.job_store.upsert_page(&page).await {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(url = %entry.url, error = %e, "failed to persist page record");
                    None
                }
            };

            for link in page.internal_links.clone() {
                if let Some(normalized) = normalize(&link) {
                    self.frontier.record_incoming_link(&normalized);
                    self.admit_and_push(
                        &normalized,
                        entry.depth + 1,
                        Some(entry.url.clone()),
                        DiscoverySource::Crawl,
                        domain,
                        &settings,
                        Some(&robots),
                    );
                }
            }

            if let Some(page_id) = page_id {
                // `internal_links_received` is flushed onto the stored record
                // post-crawl (spec.md §4.8 step 1); detection here runs against
                // the page as extracted, strictly after extraction (spec.md §5
                // "Ordering guarantees").
                self.persist_issues(job.id, page_id, &page).await;
            }

            let _ = self
                .job_store
                .update_job_progress(job.id, job.pages_discovered, job.pages_crawled, job.pages_failed, Some(entry.url.clone()))
                .await;

            if effective_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(effective_delay_ms)).await;
            }
        }

        RunOutcome::Drained
    }

    async fn persist_issues(&mut self, job_id: Uuid, page_id: Uuid, page: &auditcrawl_types::page::PageRecord) {
        let now = Utc::now();
        for (code, details) in auditcrawl_issues::detect_page(page, &self.catalogue, now) {
            let Some(def) = self.catalogue.lookup(&code) else {
                continue;
            };
            self.tally.record(&self.catalogue, &code);
            match self.job_store.upsert_issue_aggregate(job_id, def.id).await {
                Ok(aggregate) => {
                    if let Some(aggregate_id) = aggregate.id {
                        let page_issue = PageIssue {
                            id: None,
                            crawl_id: job_id,
                            page_id,
                            issue_aggregate_id: aggregate_id,
                            details,
                        };
                        if let Err(e) = self.job_store.insert_page_issue(&page_issue).await {
                            warn!(code, error = %e, "failed to insert page issue; skipping (spec.md §7 item 4)");
                        }
                    }
                }
                Err(e) => warn!(code, error = %e, "failed to upsert issue aggregate; skipping"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::job::CrawlSettings;

    fn settings() -> CrawlSettings {
        CrawlSettings {
            max_pages: 10,
            max_depth: 2,
            ..CrawlSettings::default()
        }
    }

    #[test]
    fn admit_rejects_when_depth_exceeds_max() {
        let job_store: Arc<dyn JobStore> = Arc::new(crate::test_support::NullJobStore);
        let engine = auditcrawl_browser::static_http::engine_for("test-agent").unwrap();
        let fetcher = PageFetcher::new(engine, "ex.test");
        let mut orch = Orchestrator::new(
            job_store,
            fetcher,
            reqwest::Client::new(),
            IssueCatalogue::default(),
            CancelToken::new(),
        );
        let settings = settings();
        assert!(orch.admit("https://ex.test/a", 3, "ex.test", &settings, None).is_none());
    }

    #[test]
    fn admit_rejects_excluded_and_off_domain_urls() {
        let job_store: Arc<dyn JobStore> = Arc::new(crate::test_support::NullJobStore);
        let engine = auditcrawl_browser::static_http::engine_for("test-agent").unwrap();
        let fetcher = PageFetcher::new(engine, "ex.test");
        let mut orch = Orchestrator::new(
            job_store,
            fetcher,
            reqwest::Client::new(),
            IssueCatalogue::default(),
            CancelToken::new(),
        );
        let settings = settings();
        assert!(orch.admit("https://other.test/a", 1, "ex.test", &settings, None).is_none());
        assert!(orch.admit("https://ex.test/admin/x", 1, "ex.test", &settings, None).is_none());
        // utm_* is an excluded query key (spec.md §4.1, normalize.rs's own
        // `is_seo_relevant` test); admission rejects it same as spec scenario #1.
        assert!(orch.admit("https://ex.test/about?utm_source=x", 1, "ex.test", &settings, None).is_none());
        assert!(orch.admit("https://ex.test/about", 1, "ex.test", &settings, None).is_some());
    }

    #[test]
    fn admit_is_idempotent_across_repeated_calls() {
        let job_store: Arc<dyn JobStore> = Arc::new(crate::test_support::NullJobStore);
        let engine = auditcrawl_browser::static_http::engine_for("test-agent").unwrap();
        let fetcher = PageFetcher::new(engine, "ex.test");
        let mut orch = Orchestrator::new(
            job_store,
            fetcher,
            reqwest::Client::new(),
            IssueCatalogue::default(),
            CancelToken::new(),
        );
        let settings = settings();
        assert!(orch.admit_and_push("https://ex.test/a", 1, None, DiscoverySource::Crawl, "ex.test", &settings, None));
        assert!(!orch.admit_and_push("https://ex.test/a", 1, None, DiscoverySource::Crawl, "ex.test", &settings, None));
        assert_eq!(orch.frontier().discovered_count(), 1);
    }
}
