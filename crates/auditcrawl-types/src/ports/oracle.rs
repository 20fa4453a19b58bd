//! Upstream performance oracle port (spec.md §2: "the core only calls it for
//! the seed and stores the result").

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub mobile_score: Option<u32>,
    pub desktop_score: Option<u32>,
    pub field_data_percentiles: serde_json::Value,
    pub opportunities: Vec<String>,
    pub diagnostics: Vec<String>,
}

/// A Lighthouse-style single-URL audit oracle. Skipped entirely when its API
/// key is absent from the environment (spec.md §6 "Environment").
#[async_trait]
pub trait PerformanceOracle: Send + Sync {
    async fn audit(&self, url: &str) -> Result<PerformanceReport>;
}
