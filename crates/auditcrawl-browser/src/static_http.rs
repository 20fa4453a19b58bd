//! A `BrowserEngine` implementation that fetches via `reqwest` and never
//! executes JavaScript. Used whenever `render_javascript = false`, and as the
//! engine tests run against (spec.md §4.4a).

use async_trait::async_trait;
use auditcrawl_types::errors::{CrawlError, Result};
use auditcrawl_types::page::RedirectHop;
use auditcrawl_types::ports::browser::{
    BrowserEngine, NavigateOutcome, PageHandle, PerformanceTimings, WaitUntil,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Clone)]
pub struct StaticHttpEngine {
    client: reqwest::Client,
}

impl StaticHttpEngine {
    pub fn new(user_agent: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.into())
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| CrawlError::Browser(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BrowserEngine for StaticHttpEngine {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>> {
        Ok(Box::new(StaticHttpPage {
            client: self.client.clone(),
            last_body: Mutex::new(String::new()),
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct StaticHttpPage {
    client: reqwest::Client,
    last_body: Mutex<String>,
}

#[async_trait]
impl PageHandle for StaticHttpPage {
    async fn goto(
        &self,
        url: &str,
        _wait_until: WaitUntil,
        timeout_ms: u64,
    ) -> Result<NavigateOutcome> {
        let mut chain = Vec::new();
        let mut current = url.to_string();
        // Manual redirect following so every hop is recorded, mirroring what
        // the headless engine observes via its response-event subscription
        // (spec.md §4.4: "Subscribes to response events to record the
        // redirect chain").
        for _ in 0..10 {
            let resp = self
                .client
                .get(&current)
                .timeout(std::time::Duration::from_millis(timeout_ms))
                .send()
                .await
                .map_err(|e| CrawlError::Browser(e.to_string()))?;

            let status = resp.status().as_u16();
            if (300..400).contains(&status) {
                if let Some(location) = resp.headers().get(reqwest::header::LOCATION) {
                    let location = location.to_str().unwrap_or_default();
                    let next = url::Url::parse(&current)
                        .ok()
                        .and_then(|base| base.join(location).ok())
                        .map(|u| u.to_string())
                        .unwrap_or_else(|| location.to_string());
                    chain.push(RedirectHop {
                        url: current.clone(),
                        status_code: status,
                    });
                    debug!(from = %current, to = %next, status, "following redirect");
                    current = next;
                    continue;
                }
            }

            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            let body = resp
                .text()
                .await
                .map_err(|e| CrawlError::Browser(e.to_string()))?;
            *self.last_body.lock().await = body;

            return Ok(NavigateOutcome {
                final_url: current,
                status_code: status,
                content_type,
                redirect_chain: chain,
            });
        }

        Err(CrawlError::Browser(format!(
            "too many redirects starting at {url}"
        )))
    }

    async fn content(&self) -> Result<String> {
        Ok(self.last_body.lock().await.clone())
    }

    async fn performance_timings(&self) -> Result<PerformanceTimings> {
        // No JS execution, so no in-page performance entries are available.
        Ok(PerformanceTimings::default())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Re-export so `auditcrawl-fetch` can construct one without a direct
/// `auditcrawl-browser` -> `reqwest` re-export dance.
pub fn engine_for(user_agent: &str) -> Result<Arc<dyn BrowserEngine>> {
    Ok(Arc::new(StaticHttpEngine::new(user_agent)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_page_starts_with_empty_content() {
        let engine = StaticHttpEngine::new("test-agent").unwrap();
        let page = engine.new_page().await.unwrap();
        assert_eq!(page.content().await.unwrap(), "");
    }
}
