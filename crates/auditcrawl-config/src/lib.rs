//! Worker process configuration: environment loading (spec.md §6
//! "Environment") and crawl-settings defaults (spec.md §3 `CrawlSettings`).

pub mod env;

pub use env::{EnvConfigLoader, EnvError};

/// Everything the worker binary needs before it can start polling the job
/// store (spec.md §6: "Two required: the job-store base URL and a service
/// credential. One optional: a performance-oracle API key").
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub job_store_url: String,
    pub job_store_credential: String,
    pub performance_oracle_api_key: Option<String>,
    /// Interval for the pending-job poll backstop (spec.md §4.9: "every 30s").
    pub poll_backstop_secs: u64,
    /// Interval for the auto-resume retry backstop (spec.md §4.9: "every 5 min").
    pub resume_backstop_secs: u64,
    /// Staleness threshold for orphan recovery (spec.md §4.9 step 1: "5 min").
    pub stale_job_secs: i64,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, EnvError> {
        let loader = EnvConfigLoader::new().with_prefix("AUDITCRAWL_");
        Ok(Self {
            job_store_url: loader.get("job_store_url")?,
            job_store_credential: loader.get("job_store_credential")?,
            performance_oracle_api_key: loader.get_optional("performance_oracle_api_key"),
            poll_backstop_secs: 30,
            resume_backstop_secs: 300,
            stale_job_secs: 300,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_vars_error_out() {
        std::env::remove_var("AUDITCRAWL_JOB_STORE_URL");
        std::env::remove_var("AUDITCRAWL_JOB_STORE_CREDENTIAL");
        assert!(WorkerConfig::from_env().is_err());
    }

    #[test]
    fn oracle_key_is_optional() {
        std::env::set_var("AUDITCRAWL_JOB_STORE_URL", "postgres://x/y");
        std::env::set_var("AUDITCRAWL_JOB_STORE_CREDENTIAL", "secret");
        std::env::remove_var("AUDITCRAWL_PERFORMANCE_ORACLE_API_KEY");
        let cfg = WorkerConfig::from_env().unwrap();
        assert!(cfg.performance_oracle_api_key.is_none());
        std::env::remove_var("AUDITCRAWL_JOB_STORE_URL");
        std::env::remove_var("AUDITCRAWL_JOB_STORE_CREDENTIAL");
    }
}
