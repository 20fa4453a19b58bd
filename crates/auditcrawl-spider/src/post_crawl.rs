//! Post-Crawl Analyzer (spec.md §4.8): runs once the frontier has drained
//! and the run was not cancelled. Flushes the back-reference table, flags
//! graph-wide page issues (orphans, depth, dead ends), computes the site
//! health score and category scores, optionally calls the external
//! performance oracle for the homepage, and computes the AI-search score.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use auditcrawl_issues::{IssueCatalogue, IssueTally};
use auditcrawl_robots::{AccessState, RobotsPolicy, AI_USER_AGENTS};
use auditcrawl_types::errors::Result;
use auditcrawl_types::issue::PageIssue;
use auditcrawl_types::job::CrawlJob;
use auditcrawl_types::ports::job_store::JobStore;
use auditcrawl_types::ports::oracle::PerformanceOracle;
use tracing::{debug, warn};

const LLMS_TXT_TIMEOUT: Duration = Duration::from_secs(10);
const ORACLE_TIMEOUT: Duration = Duration::from_secs(60);
const MIN_AI_DOC_LEN: usize = 50;

pub struct PostCrawlAnalyzer {
    job_store: Arc<dyn JobStore>,
    catalogue: IssueCatalogue,
    oracle: Option<Arc<dyn PerformanceOracle>>,
    http: reqwest::Client,
}

impl PostCrawlAnalyzer {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        catalogue: IssueCatalogue,
        oracle: Option<Arc<dyn PerformanceOracle>>,
        http: reqwest::Client,
    ) -> Self {
        Self { job_store, catalogue, oracle, http }
    }

    /// Run every post-crawl step and write the job's finalize aggregates
    /// (spec.md §4.8, §6 "CrawlJob aggregates written at finalize").
    pub async fn run(
        &self,
        job: &mut CrawlJob,
        domain: &str,
        incoming_links: &HashMap<String, u32>,
        robots: &RobotsPolicy,
        mut tally: IssueTally,
    ) -> Result<()> {
        self.flush_incoming_links(job.id, incoming_links).await;

        let pages = self.job_store.indexable_pages(job.id).await?;
        for page in &pages {
            let Some(page_id) = page.id else { continue };
            for (code, details) in auditcrawl_issues::detect_graph_issues(page, &self.catalogue) {
                tally.record(&self.catalogue, &code);
                self.persist_issue(job.id, page_id, &code, details).await;
            }
        }

        job.health_score = Some(tally.health_score());
        job.total_issues = tally.counts.total;
        job.errors_count = tally.counts.errors;
        job.warnings_count = tally.counts.warnings;
        job.notices_count = tally.counts.notices;
        job.category_scores = tally
            .category_scores()
            .into_iter()
            .map(|(cat, score)| (format!("{cat:?}"), score))
            .collect();

        if let Some(ai_score) = self.ai_search_score(domain, robots, &pages).await {
            job.category_scores.insert("ai_search".to_string(), ai_score);
        }

        if let Some(oracle) = &self.oracle {
            self.run_oracle(job, domain, &pages, oracle.as_ref()).await;
        }

        Ok(())
    }

    async fn flush_incoming_links(&self, job_id: uuid::Uuid, incoming_links: &HashMap<String, u32>) {
        for (url, count) in incoming_links {
            let url_hash = auditcrawl_types::sha256_hex(url);
            if let Err(e) = self.job_store.set_internal_links_received(job_id, &url_hash, *count).await {
                warn!(%url, error = %e, "failed to flush incoming link count");
            }
        }
    }

    async fn persist_issue(&self, job_id: uuid::Uuid, page_id: uuid::Uuid, code: &str, details: serde_json::Value) {
        let Some(def) = self.catalogue.lookup(code) else {
            return;
        };
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
                        warn!(code, error = %e, "failed to insert graph-level page issue; skipping");
                    }
                }
            }
            Err(e) => warn!(code, error = %e, "failed to upsert graph-level issue aggregate; skipping"),
        }
    }

    /// Best-effort, non-fatal: on any sub-analyzer failure the job's
    /// terminal status is unaffected (spec.md §7 item 5).
    async fn run_oracle(
        &self,
        job: &CrawlJob,
        domain: &str,
        pages: &[auditcrawl_types::page::PageRecord],
        oracle: &dyn PerformanceOracle,
    ) {
        let Some(homepage) = pages.iter().find(|p| p.page_depth == 0) else {
            return;
        };
        let url = homepage.url.clone();
        let report = tokio::time::timeout(ORACLE_TIMEOUT, oracle.audit(&url)).await;
        match report {
            Ok(Ok(report)) => {
                let mut updated = homepage.clone();
                updated.analysis["performance_oracle"] = serde_json::json!({
                    "mobile_score": report.mobile_score,
                    "desktop_score": report.desktop_score,
                    "field_data_percentiles": report.field_data_percentiles,
                    "opportunities": report.opportunities,
                    "diagnostics": report.diagnostics,
                });
                if let Err(e) = self.job_store.upsert_page(&updated).await {
                    warn!(%domain, error = %e, "failed to persist performance oracle report");
                }
            }
            Ok(Err(e)) => debug!(%domain, error = %e, "performance oracle call failed; skipping"),
            Err(_) => debug!(%domain, "performance oracle call timed out; skipping"),
        }
        let _ = job;
    }

    /// AI-search scoring (spec.md §4.8 step 6): combines robots AI-bot
    /// access flags, `llms.txt`/`ai.txt` presence and validity, the ratio of
    /// AI-optimized pages, and FAQ/HowTo/Speakable schema counts into a
    /// single 0-100 composite, starting at 100 and deducting per a fixed
    /// penalty table.
    async fn ai_search_score(
        &self,
        domain: &str,
        robots: &RobotsPolicy,
        pages: &[auditcrawl_types::page::PageRecord],
    ) -> Option<u32> {
        let mut score: i64 = 100;

        let disallowed = robots
            .ai_bot_access()
            .into_iter()
            .filter(|(_, state)| *state == AccessState::ExplicitlyDisallowed)
            .count();
        score -= (disallowed as i64 * 2).min(20);
        debug!(disallowed, bots = AI_USER_AGENTS.len(), "ai-bot access tallied");

        if !self.probe_ai_doc(domain, "llms.txt").await {
            score -= 15;
        }
        if !self.probe_ai_doc(domain, "ai.txt").await {
            score -= 10;
        }

        let total = pages.len();
        if total > 0 {
            let optimized = pages.iter().filter(|p| is_ai_optimized(p)).count();
            let ratio = optimized as f64 / total as f64;
            score -= ((1.0 - ratio) * 25.0).round() as i64;
        }

        let has_rich_schema = pages.iter().any(|p| {
            p.schema_types
                .iter()
                .any(|t| matches!(t.as_str(), "FAQPage" | "HowTo" | "Speakable"))
        });
        if !has_rich_schema {
            score -= 10;
        }

        Some(score.clamp(0, 100) as u32)
    }

    /// Probe `https://{domain}/{name}` with a 10s timeout; valid iff non-empty,
    /// at least [`MIN_AI_DOC_LEN`] bytes, and contains a title/URL marker.
    async fn probe_ai_doc(&self, domain: &str, name: &str) -> bool {
        let url = format!("https://{domain}/{name}");
        let resp = match self.http.get(&url).timeout(LLMS_TXT_TIMEOUT).send().await {
            Ok(r) if r.status().is_success() => r,
            _ => return false,
        };
        let Ok(body) = resp.text().await else { return false };
        let body = body.trim();
        if body.len() < MIN_AI_DOC_LEN {
            return false;
        }
        body.contains('#') || body.contains("http://") || body.contains("https://")
    }
}

fn is_ai_optimized(page: &auditcrawl_types::page::PageRecord) -> bool {
    page.h1_count == 1
        && page.h2_count >= 2
        && page.word_count >= 300
        && page.title_length.unwrap_or(0) >= 20
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::job::DiscoverySource;
    use uuid::Uuid;

    fn page(h1: u32, h2: u32, words: u32, title_len: u32) -> auditcrawl_types::page::PageRecord {
        let mut p = auditcrawl_types::page::PageRecord::minimal(
            Uuid::new_v4(),
            "https://ex.test/".to_string(),
            200,
            Some("text/html".to_string()),
            100,
            "ok",
            0,
            DiscoverySource::Seed,
        );
        p.h1_count = h1;
        p.h2_count = h2;
        p.word_count = words;
        p.title_length = Some(title_len);
        p
    }

    #[test]
    fn ai_optimized_requires_all_four_thresholds() {
        assert!(is_ai_optimized(&page(1, 3, 500, 25)));
        assert!(!is_ai_optimized(&page(2, 3, 500, 25)));
        assert!(!is_ai_optimized(&page(1, 1, 500, 25)));
        assert!(!is_ai_optimized(&page(1, 3, 100, 25)));
        assert!(!is_ai_optimized(&page(1, 3, 500, 10)));
    }
}
