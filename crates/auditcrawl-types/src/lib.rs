//! # AuditCrawl Types
//!
//! Shared domain model, error taxonomy and port traits for the site-auditing
//! crawler. This crate performs no I/O; every other crate in the workspace
//! depends on it for the vocabulary they exchange records in.

pub mod errors;
pub mod issue;
pub mod job;
pub mod page;
pub mod ports;

pub use errors::{CrawlError, Result};
pub use issue::{IssueAggregate, IssueCategory, IssueDefinition, IssueSeverity, PageIssue};
pub use job::{CrawlJob, CrawlSettings, FrontierEntry, JobStatus, Project, ResumeInfo};
pub use page::{DiscoverySource, PageRecord, RedirectHop};

/// SHA-256 hex digest, used for `url_hash` and `content_hash`.
pub fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_is_stable_and_lowercase() {
        let a = sha256_hex("https://example.test/");
        let b = sha256_hex("https://example.test/");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn health_score_is_clamped_to_0_100() {
        assert_eq!(issue::score(0, 0, 0), 100);
        assert_eq!(issue::score(100, 0, 0), 0);
        assert_eq!(issue::score(5, 0, 0), 75);
        assert_eq!(issue::score(0, 0, 3), 98); // floor(0.5*3) = 1
    }

    #[test]
    fn job_status_terminal_states() {
        assert!(job::JobStatus::Completed.is_terminal());
        assert!(job::JobStatus::Failed.is_terminal());
        assert!(job::JobStatus::Cancelled.is_terminal());
        assert!(!job::JobStatus::Pending.is_terminal());
        assert!(!job::JobStatus::Processing.is_terminal());
    }
}
