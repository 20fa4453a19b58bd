//! Crate-wide error taxonomy.
//!
//! Each downstream crate defines its own `thiserror` enum at its own seam
//! (`RobotsError`, `FetchError`, ...); `CrawlError` is the umbrella type the
//! orchestrator and the job controller use to report a failure against a job
//! without caring which layer it came from.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrawlError>;

/// Errors the job controller and orchestrator surface at the job boundary.
///
/// These correspond to the taxonomy in spec.md §7: transient network errors are
/// handled (retried) below this level and never reach here; what does reach
/// here is either a permanent per-page failure (folded into a page record, not
/// this error) or a fatal job-level error.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("robots.txt error: {0}")]
    Robots(String),

    #[error("sitemap error: {0}")]
    Sitemap(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("extraction error: {0}")]
    Extract(String),

    #[error("job store error: {0}")]
    Store(String),

    #[error("browser engine error: {0}")]
    Browser(String),

    #[error("job {job_id} not found")]
    JobNotFound { job_id: uuid::Uuid },

    #[error("issue catalogue for job {job_id} is empty or missing")]
    MissingCatalogue { job_id: uuid::Uuid },

    #[error("{message}")]
    Fatal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CrawlError {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
            source: None,
        }
    }
}
