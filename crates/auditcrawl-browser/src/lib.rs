//! # AuditCrawl Browser
//!
//! Two implementations of the `BrowserEngine`/`PageHandle` ports from
//! `auditcrawl-types`: a real CDP-backed headless engine and a static-HTML
//! engine that satisfies the same contract without executing JavaScript
//! (spec.md §9: "any implementation ... satisfies the contract as long as it
//! returns redirect chain, final URL, status, and a DOM handle").

pub mod static_http;

#[cfg(feature = "headless")]
pub mod headless;

pub use auditcrawl_types::ports::browser::{
    BrowserEngine, NavigateOutcome, PageHandle, PerformanceTimings, WaitUntil,
};
pub use static_http::StaticHttpEngine;

#[cfg(feature = "headless")]
pub use headless::HeadlessEngine;
