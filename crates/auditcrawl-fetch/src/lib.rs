//! Page Fetcher (spec.md §4.4): drives a [`BrowserEngine`] page to navigate
//! one URL, retries transient network failures with exponential backoff,
//! classifies the outcome, and hands successful HTML off to
//! `auditcrawl-extract`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use auditcrawl_browser::{NavigateOutcome, PageHandle, WaitUntil};
use auditcrawl_extract::TransportMeta;
use auditcrawl_types::job::DiscoverySource;
use auditcrawl_types::page::PageRecord;
use auditcrawl_types::ports::browser::{BrowserEngine, PerformanceTimings};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

const MAX_RETRIES: u32 = 2;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Network error substrings that indicate a transient failure worth
/// retrying, mirroring common Node/CDP navigation error strings.
const RETRYABLE_PATTERNS: &[&str] = &[
    "econnreset",
    "etimedout",
    "socket hang up",
    "aborted",
    "err_connection_",
    "err_network_changed",
    "err_timed_out",
];

fn is_retryable(message: &str) -> bool {
    let lower = message.to_lowercase();
    RETRYABLE_PATTERNS.iter().any(|p| lower.contains(p))
}

fn is_html_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_lowercase().contains("text/html"))
        .unwrap_or(false)
}

/// Fetches one page at a time through a shared [`BrowserEngine`].
pub struct PageFetcher {
    engine: Arc<dyn BrowserEngine>,
    project_domain: String,
}

impl PageFetcher {
    pub fn new(engine: Arc<dyn BrowserEngine>, project_domain: impl Into<String>) -> Self {
        Self {
            engine,
            project_domain: project_domain.into(),
        }
    }

    /// Crawl one URL end to end: navigate (with retry), classify the
    /// outcome, and extract a [`PageRecord`] on success.
    #[instrument(skip(self), fields(url = %url, depth))]
    pub async fn crawl(
        &self,
        crawl_id: Uuid,
        url: &str,
        depth: u32,
        discovered_via: DiscoverySource,
        render_javascript: bool,
    ) -> PageRecord {
        let wait_until = if render_javascript {
            WaitUntil::NetworkIdle
        } else {
            WaitUntil::DomContentLoaded
        };

        let page = match self.engine.new_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "failed to open browser page");
                return PageRecord::minimal(
                    crawl_id,
                    url.to_string(),
                    0,
                    None,
                    0,
                    format!("browser error: {e}"),
                    depth,
                    discovered_via,
                );
            }
        };

        let started = Instant::now();
        let outcome = self.navigate_with_retry(page.as_ref(), url, wait_until).await;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let record = match outcome {
            Ok(nav) if !is_html_content_type(nav.content_type.as_deref()) => {
                debug!(content_type = ?nav.content_type, "non-HTML content, skipping extraction");
                PageRecord::minimal(
                    crawl_id,
                    nav.final_url,
                    nav.status_code,
                    nav.content_type,
                    response_time_ms,
                    "Not HTML content",
                    depth,
                    discovered_via,
                )
            }
            Ok(nav) => {
                let html = page.content().await.unwrap_or_default();
                let mut record = auditcrawl_extract::extract(
                    crawl_id,
                    &nav.final_url,
                    &self.project_domain,
                    depth,
                    discovered_via,
                    &html,
                    TransportMeta {
                        status_code: nav.status_code,
                        redirect_url: nav.redirect_chain.last().map(|h| h.url.clone()),
                        redirect_chain: nav.redirect_chain,
                        content_type: nav.content_type,
                        response_time_ms,
                    },
                );

                if render_javascript {
                    if let Ok(timings) = page.performance_timings().await {
                        apply_timings(&mut record, timings);
                    }
                }

                record
            }
            Err(reason) => PageRecord::minimal(
                crawl_id,
                url.to_string(),
                0,
                None,
                response_time_ms,
                reason,
                depth,
                discovered_via,
            ),
        };

        let _ = page.close().await;
        record
    }

    /// Navigate with up to [`MAX_RETRIES`] retries on a retryable network
    /// error, backing off `1s * 2^attempt` between attempts.
    async fn navigate_with_retry(
        &self,
        page: &dyn PageHandle,
        url: &str,
        wait_until: WaitUntil,
    ) -> Result<NavigateOutcome, String> {
        let mut attempt = 0;
        loop {
            match page.goto(url, wait_until, NAVIGATION_TIMEOUT.as_millis() as u64).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    let message = e.to_string();
                    if attempt < MAX_RETRIES && is_retryable(&message) {
                        let backoff = INITIAL_BACKOFF * 2u32.pow(attempt);
                        warn!(attempt, %message, backoff_ms = backoff.as_millis() as u64, "retrying navigation");
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(message);
                }
            }
        }
    }
}

fn apply_timings(record: &mut PageRecord, timings: PerformanceTimings) {
    record.lcp_ms = timings.lcp_ms;
    record.fcp_ms = timings.fcp_ms;
    record.ttfb_ms = timings.ttfb_ms;
    record.cls_score = timings.cls_score;
    record.inp_ms = timings.inp_ms;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_retryable_network_errors() {
        assert!(is_retryable("Error: ECONNRESET"));
        assert!(is_retryable("net::ERR_CONNECTION_REFUSED"));
        assert!(is_retryable("socket hang up"));
        assert!(!is_retryable("Error: 404 Not Found"));
    }

    #[test]
    fn html_content_type_detection_is_case_insensitive() {
        assert!(is_html_content_type(Some("Text/HTML; charset=utf-8")));
        assert!(!is_html_content_type(Some("application/pdf")));
        assert!(!is_html_content_type(None));
    }

    #[tokio::test]
    async fn crawl_extracts_a_page_record_for_a_successful_html_fetch() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><head><title>Home</title></head><body><h1>Hi</h1></body></html>"),
            )
            .mount(&server)
            .await;

        let engine = auditcrawl_browser::static_http::engine_for("test-agent").unwrap();
        let fetcher = PageFetcher::new(engine, "example.test");
        let record = fetcher
            .crawl(
                Uuid::new_v4(),
                &server.uri(),
                0,
                DiscoverySource::Seed,
                false,
            )
            .await;

        assert_eq!(record.status_code, 200);
        assert_eq!(record.title.as_deref(), Some("Home"));
        assert!(record.is_indexable);
    }

    #[tokio::test]
    async fn crawl_classifies_non_html_content_as_not_indexable() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"%PDF-1.4".to_vec()),
            )
            .mount(&server)
            .await;

        let engine = auditcrawl_browser::static_http::engine_for("test-agent").unwrap();
        let fetcher = PageFetcher::new(engine, "example.test");
        let record = fetcher
            .crawl(Uuid::new_v4(), &server.uri(), 0, DiscoverySource::Seed, false)
            .await;

        assert!(!record.is_indexable);
        assert_eq!(record.indexability_reason.as_deref(), Some("Not HTML content"));
    }
}
