//! Headless browser control port (spec.md §9: "modeled as
//! `BrowserContext.OpenPage(url, waitCondition, timeout)`; any implementation
//! (real browser driver or a pluggable static-HTML fetcher used for tests)
//! satisfies the contract as long as it returns redirect chain, final URL,
//! status, and a DOM handle").

use crate::errors::Result;
use crate::page::RedirectHop;
use async_trait::async_trait;

/// Navigation wait condition (spec.md §4.4: `networkidle` when JS rendering is
/// enabled, `domcontentloaded` otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    DomContentLoaded,
    NetworkIdle,
}

/// Result of a single navigation attempt.
#[derive(Debug, Clone)]
pub struct NavigateOutcome {
    pub final_url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub redirect_chain: Vec<RedirectHop>,
}

/// A browser context capable of opening pages. Owned by the orchestrator,
/// created once per job (spec.md §5 "Shared resource policy").
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>>;
    async fn close(&self) -> Result<()>;
}

/// A single short-lived page, always closed on all exit paths.
#[async_trait]
pub trait PageHandle: Send + Sync {
    async fn goto(
        &self,
        url: &str,
        wait_until: WaitUntil,
        timeout_ms: u64,
    ) -> Result<NavigateOutcome>;

    async fn content(&self) -> Result<String>;

    /// Best-effort in-page performance timings (spec.md §4.4: core web
    /// vitals, populated only when JS rendering is enabled). Returns `None`
    /// entries for metrics the page didn't surface.
    async fn performance_timings(&self) -> Result<PerformanceTimings>;

    async fn close(&self) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceTimings {
    pub lcp_ms: Option<f64>,
    pub fcp_ms: Option<f64>,
    pub ttfb_ms: Option<f64>,
    pub cls_score: Option<f64>,
    pub inp_ms: Option<f64>,
}
