//! # AuditCrawl Sitemap
//!
//! Fetches sitemaps (plain or gzipped), resolves sitemap indexes
//! breadth-first, and yields same-domain URLs with metadata, bounded by a
//! URL cap (spec.md §4.3).

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: Option<String>,
    pub priority: Option<f64>,
}

pub struct SitemapReader {
    client: reqwest::Client,
    user_agent: String,
    /// Total-URL cap across every sitemap resolved for one job.
    url_cap: usize,
}

impl SitemapReader {
    pub fn new(client: reqwest::Client, user_agent: impl Into<String>, url_cap: usize) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            url_cap,
        }
    }

    /// Resolve a list of candidate sitemap URLs (or probe the two standard
    /// locations if the list is empty) into a flat list of same-domain
    /// entries. Loop termination is guaranteed by the `processed` set.
    pub async fn read_all(&self, domain: &str, candidates: &[String]) -> Vec<SitemapEntry> {
        let mut queue: VecDeque<String> = if candidates.is_empty() {
            VecDeque::from([
                format!("https://{domain}/sitemap.xml"),
                format!("https://{domain}/sitemap_index.xml"),
            ])
        } else {
            candidates.iter().cloned().collect()
        };

        let mut processed: HashSet<String> = HashSet::new();
        let mut entries = Vec::new();

        while let Some(sitemap_url) = queue.pop_front() {
            if entries.len() >= self.url_cap {
                debug!(cap = self.url_cap, "sitemap URL cap reached, stopping");
                break;
            }
            if !processed.insert(sitemap_url.clone()) {
                continue;
            }

            let body = match self.fetch_body(&sitemap_url).await {
                Some(b) => b,
                None => continue,
            };

            if is_sitemap_index(&body) {
                for loc in extract_locs(&body) {
                    if !processed.contains(&loc) {
                        queue.push_back(loc);
                    }
                }
                continue;
            }

            for entry in parse_urlset(&body) {
                if !same_domain(&entry.loc, domain) {
                    continue;
                }
                entries.push(entry);
                if entries.len() >= self.url_cap {
                    break;
                }
            }
        }

        info!(count = entries.len(), domain, "sitemap resolution complete");
        entries
    }

    async fn fetch_body(&self, url: &str) -> Option<String> {
        let resp = match self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .timeout(Duration::from_secs(10))
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!(%url, status = %r.status(), "sitemap fetch non-2xx");
                return None;
            }
            Err(e) => {
                warn!(%url, error = %e, "sitemap fetch failed");
                return None;
            }
        };

        let bytes = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!(%url, error = %e, "failed reading sitemap body");
                return None;
            }
        };

        if url.ends_with(".gz") {
            use std::io::Read;
            let mut decoder = flate2::read::GzDecoder::new(&bytes[..]);
            let mut out = String::new();
            match decoder.read_to_string(&mut out) {
                Ok(_) => Some(out),
                Err(e) => {
                    warn!(%url, error = %e, "failed gunzipping sitemap");
                    None
                }
            }
        } else {
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

fn is_sitemap_index(body: &str) -> bool {
    body.contains("<sitemapindex")
}

/// Extract every `<loc>...</loc>` value from an XML document (used for both
/// `<sitemapindex>` index entries and individual `<url>` blocks below).
fn extract_locs(body: &str) -> Vec<String> {
    extract_elements(body, "loc")
}

fn extract_elements(body: &str, tag: &str) -> Vec<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut out = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find(&open) {
        let after_open = &rest[start + open.len()..];
        let Some(end) = after_open.find(&close) else {
            break;
        };
        out.push(after_open[..end].trim().to_string());
        rest = &after_open[end + close.len()..];
    }
    out
}

/// Parse `<url>...</url>` blocks out of a plain (non-index) sitemap body.
fn parse_urlset(body: &str) -> Vec<SitemapEntry> {
    let mut entries = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find("<url>").or_else(|| rest.find("<url ")) {
        let after = &rest[start..];
        let Some(end_rel) = after.find("</url>") else {
            break;
        };
        let block = &after[..end_rel];
        if let Some(loc) = extract_elements(block, "loc").into_iter().next() {
            entries.push(SitemapEntry {
                loc,
                lastmod: extract_elements(block, "lastmod").into_iter().next(),
                changefreq: extract_elements(block, "changefreq").into_iter().next(),
                priority: extract_elements(block, "priority")
                    .into_iter()
                    .next()
                    .and_then(|p| p.parse().ok()),
            });
        }
        rest = &after[end_rel + "</url>".len()..];
    }
    entries
}

/// Same-domain check including subdomains of `domain`.
fn same_domain(url: &str, domain: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.strip_prefix("www.").unwrap_or(host).to_lowercase();
    let domain = domain.strip_prefix("www.").unwrap_or(domain).to_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_sitemap_index() {
        assert!(is_sitemap_index("<sitemapindex><sitemap><loc>x</loc></sitemap></sitemapindex>"));
        assert!(!is_sitemap_index("<urlset><url><loc>x</loc></url></urlset>"));
    }

    #[test]
    fn parses_urlset_entries() {
        let body = r#"<urlset>
            <url><loc>https://ex.test/a</loc><lastmod>2024-01-01</lastmod><priority>0.8</priority></url>
            <url><loc>https://ex.test/b</loc></url>
        </urlset>"#;
        let entries = parse_urlset(body);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].loc, "https://ex.test/a");
        assert_eq!(entries[0].lastmod.as_deref(), Some("2024-01-01"));
        assert_eq!(entries[0].priority, Some(0.8));
        assert!(entries[1].lastmod.is_none());
    }

    #[test]
    fn extracts_index_locs() {
        let body = "<sitemapindex><sitemap><loc>https://ex.test/s1.xml</loc></sitemap>\
                    <sitemap><loc>https://ex.test/s2.xml</loc></sitemap></sitemapindex>";
        assert_eq!(
            extract_locs(body),
            vec![
                "https://ex.test/s1.xml".to_string(),
                "https://ex.test/s2.xml".to_string()
            ]
        );
    }

    #[test]
    fn same_domain_allows_subdomains() {
        assert!(same_domain("https://shop.ex.test/a", "ex.test"));
        assert!(same_domain("https://www.ex.test/a", "ex.test"));
        assert!(!same_domain("https://other.test/a", "ex.test"));
    }
}
