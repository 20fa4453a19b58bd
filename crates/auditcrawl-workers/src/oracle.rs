//! PageSpeed-Insights-style `PerformanceOracle` adapter. Skipped entirely by
//! [`crate::build_oracle`] when no API key is configured (spec.md §6
//! "Environment").

use async_trait::async_trait;
use auditcrawl_types::errors::{CrawlError, Result};
use auditcrawl_types::ports::oracle::{PerformanceOracle, PerformanceReport};

const API_BASE: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

pub struct PageSpeedOracle {
    http: reqwest::Client,
    api_key: String,
}

impl PageSpeedOracle {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self { http, api_key: api_key.into() }
    }

    async fn run(&self, url: &str, strategy: &str) -> Result<serde_json::Value> {
        let resp = self
            .http
            .get(API_BASE)
            .query(&[("url", url), ("strategy", strategy), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| CrawlError::Fatal { message: format!("oracle request failed: {e}"), source: None })?;

        if !resp.status().is_success() {
            return Err(CrawlError::Fatal {
                message: format!("oracle returned {}", resp.status()),
                source: None,
            });
        }

        resp.json::<serde_json::Value>()
            .await
            .map_err(|e| CrawlError::Fatal { message: format!("failed to parse oracle response: {e}"), source: None })
    }
}

#[async_trait]
impl PerformanceOracle for PageSpeedOracle {
    async fn audit(&self, url: &str) -> Result<PerformanceReport> {
        let (mobile, desktop) = tokio::try_join!(self.run(url, "mobile"), self.run(url, "desktop"))?;

        let mobile_score = performance_score(&mobile);
        let desktop_score = performance_score(&desktop);
        let opportunities = audits_named(&mobile, "opportunity");
        let diagnostics = audits_named(&mobile, "diagnostics");

        Ok(PerformanceReport {
            mobile_score,
            desktop_score,
            field_data_percentiles: mobile
                .get("loadingExperience")
                .cloned()
                .unwrap_or(serde_json::Value::Null),
            opportunities,
            diagnostics,
        })
    }
}

fn performance_score(report: &serde_json::Value) -> Option<u32> {
    report
        .pointer("/lighthouseResult/categories/performance/score")
        .and_then(|v| v.as_f64())
        .map(|v| (v * 100.0).round() as u32)
}

fn audits_named(report: &serde_json::Value, group: &str) -> Vec<String> {
    let Some(audits) = report.pointer("/lighthouseResult/audits").and_then(|v| v.as_object()) else {
        return Vec::new();
    };
    audits
        .values()
        .filter(|audit| audit.get("scoreDisplayMode").and_then(|v| v.as_str()) == Some(group))
        .filter_map(|audit| audit.get("title").and_then(|v| v.as_str()).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn performance_score_reads_the_lighthouse_pointer() {
        let report = serde_json::json!({
            "lighthouseResult": { "categories": { "performance": { "score": 0.87 } } }
        });
        assert_eq!(performance_score(&report), Some(87));
    }

    #[test]
    fn performance_score_is_none_when_missing() {
        assert_eq!(performance_score(&serde_json::json!({})), None);
    }
}
