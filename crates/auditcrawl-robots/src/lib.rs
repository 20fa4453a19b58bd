//! # AuditCrawl Robots
//!
//! Fetches and parses `/robots.txt` and answers policy questions for it:
//! *is this URL allowed for our user agent*, the declared crawl-delay, the
//! listed sitemaps, and a tri-state access classification for a fixed list of
//! named AI-bot user agents (spec.md §4.2).

mod parser;

use auditcrawl_types::CrawlError;
use std::time::Duration;
use tracing::{debug, warn};

pub use parser::{AccessState, RobotsRules};

/// AI-bot user agents we classify access for (spec.md §4.2).
pub const AI_USER_AGENTS: &[&str] = &[
    "GPTBot",
    "ChatGPT-User",
    "Google-Extended",
    "anthropic-ai",
    "Claude-Web",
    "PerplexityBot",
    "Amazonbot",
    "OAI-SearchBot",
    "cohere-ai",
    "FacebookBot",
];

/// The parsed robots.txt policy for one domain, scoped to the crawler's own
/// configured user agent.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    rules: RobotsRules,
    user_agent: String,
}

impl RobotsPolicy {
    /// Fetch `https://{domain}/robots.txt`. Any non-2xx response or network
    /// error is treated as fully permissive (spec.md §4.2, P8).
    pub async fn fetch(client: &reqwest::Client, domain: &str, user_agent: &str) -> Self {
        let url = format!("https://{domain}/robots.txt");
        let body = match client
            .get(&url)
            .header("User-Agent", user_agent)
            .timeout(Duration::from_secs(10))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!(%url, error = %e, "failed to read robots.txt body; treating as permissive");
                    String::new()
                }
            },
            Ok(resp) => {
                debug!(%url, status = %resp.status(), "robots.txt non-2xx; treating as permissive");
                String::new()
            }
            Err(e) => {
                debug!(%url, error = %e, "robots.txt fetch failed; treating as permissive");
                String::new()
            }
        };

        Self {
            rules: RobotsRules::parse(&body),
            user_agent: user_agent.to_string(),
        }
    }

    pub fn from_text(body: &str, user_agent: &str) -> Self {
        Self {
            rules: RobotsRules::parse(body),
            user_agent: user_agent.to_string(),
        }
    }

    /// `IsAllowed(url, ua)` against our own configured user agent.
    pub fn is_allowed(&self, url: &str) -> bool {
        self.rules.is_allowed(&self.user_agent, url)
    }

    /// `Crawl-delay` declared for our configured user agent, if any.
    pub fn crawl_delay_ms(&self) -> Option<u64> {
        self.rules.crawl_delay_ms(&self.user_agent)
    }

    /// `Sitemap:` directives, in declaration order.
    pub fn sitemaps(&self) -> &[String] {
        &self.rules.sitemaps
    }

    /// Tri-state access classification for every AI user agent in
    /// [`AI_USER_AGENTS`].
    pub fn ai_bot_access(&self) -> Vec<(&'static str, AccessState)> {
        AI_USER_AGENTS
            .iter()
            .map(|ua| (*ua, self.rules.ai_bot_access(ua)))
            .collect()
    }

    pub fn ai_bot_access_for(&self, ua: &str) -> AccessState {
        self.rules.ai_bot_access(ua)
    }
}

pub fn classify_error(message: impl Into<String>) -> CrawlError {
    CrawlError::Robots(message.into())
}
