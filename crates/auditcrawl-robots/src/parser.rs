//! A standard-enough robots.txt parser: `User-agent`/`Disallow`/`Allow`
//! groups, `Crawl-delay`, `Sitemap:` directives, and the line-scanning AI-bot
//! tri-state classifier spec.md §4.2 calls for specifically.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    ExplicitlyAllowed,
    ExplicitlyDisallowed,
    Unmentioned,
}

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    path: String,
}

#[derive(Debug, Clone, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
    crawl_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    groups: Vec<Group>,
    pub sitemaps: Vec<String>,
    /// Raw lines, kept for the AI-bot line-scanning classifier.
    raw_lines: Vec<String>,
}

fn directive(line: &str) -> Option<(String, String)> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }
    let (key, value) = line.split_once(':')?;
    Some((key.trim().to_lowercase(), value.trim().to_string()))
}

fn agent_matches(declared: &str, ours: &str) -> bool {
    declared == "*" || ours.to_lowercase().contains(&declared.to_lowercase())
}

impl RobotsRules {
    pub fn parse(body: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut sitemaps = Vec::new();
        let mut current: Option<Group> = None;
        let mut awaiting_agents = true;

        for line in body.lines() {
            let Some((key, value)) = directive(line) else {
                // Blank or comment line ends the "still collecting agents" run.
                awaiting_agents = false;
                continue;
            };

            match key.as_str() {
                "user-agent" => {
                    if awaiting_agents {
                        // Still within the same group's agent list.
                        if let Some(g) = current.as_mut() {
                            g.agents.push(value);
                        } else {
                            current = Some(Group {
                                agents: vec![value],
                                ..Default::default()
                            });
                        }
                    } else {
                        if let Some(g) = current.take() {
                            groups.push(g);
                        }
                        current = Some(Group {
                            agents: vec![value],
                            ..Default::default()
                        });
                        awaiting_agents = true;
                    }
                }
                "disallow" => {
                    awaiting_agents = false;
                    if let Some(g) = current.as_mut() {
                        if !value.is_empty() {
                            g.rules.push(Rule {
                                allow: false,
                                path: value,
                            });
                        }
                    }
                }
                "allow" => {
                    awaiting_agents = false;
                    if let Some(g) = current.as_mut() {
                        g.rules.push(Rule {
                            allow: true,
                            path: value,
                        });
                    }
                }
                "crawl-delay" => {
                    awaiting_agents = false;
                    if let Some(g) = current.as_mut() {
                        if let Ok(secs) = value.parse::<f64>() {
                            g.crawl_delay_ms = Some((secs * 1000.0).round() as u64);
                        }
                    }
                }
                "sitemap" => {
                    awaiting_agents = false;
                    sitemaps.push(value);
                }
                _ => {
                    awaiting_agents = false;
                }
            }
        }
        if let Some(g) = current.take() {
            groups.push(g);
        }

        Self {
            groups,
            sitemaps,
            raw_lines: body.lines().map(|l| l.to_string()).collect(),
        }
    }

    fn matching_groups(&self, ua: &str) -> Vec<&Group> {
        let exact: Vec<&Group> = self
            .groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| a != "*" && agent_matches(a, ua)))
            .collect();
        if !exact.is_empty() {
            return exact;
        }
        self.groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| a == "*"))
            .collect()
    }

    fn path_of(url: &str) -> String {
        match url::Url::parse(url) {
            Ok(u) => {
                let mut p = u.path().to_string();
                if let Some(q) = u.query() {
                    p.push('?');
                    p.push_str(q);
                }
                p
            }
            Err(_) => url.to_string(),
        }
    }

    pub fn is_allowed(&self, ua: &str, url: &str) -> bool {
        let path = Self::path_of(url);
        let groups = self.matching_groups(ua);
        let mut best: Option<(usize, bool)> = None; // (match len, allow)

        for group in groups {
            for rule in &group.rules {
                if rule.path.is_empty() {
                    // An empty Disallow means "allow everything"; handled at
                    // parse time by not storing empty Disallow rules at all,
                    // so an empty path here only occurs for Allow: (ignored).
                    continue;
                }
                if path.starts_with(rule.path.as_str()) || rule.path == "/" {
                    let len = rule.path.len();
                    match best {
                        Some((best_len, _)) if len < best_len => {}
                        Some((best_len, best_allow)) if len == best_len => {
                            // Tie: Allow wins.
                            if rule.allow && !best_allow {
                                best = Some((len, true));
                            }
                        }
                        _ => best = Some((len, rule.allow)),
                    }
                }
            }
        }

        best.map(|(_, allow)| allow).unwrap_or(true)
    }

    pub fn crawl_delay_ms(&self, ua: &str) -> Option<u64> {
        self.matching_groups(ua)
            .into_iter()
            .find_map(|g| g.crawl_delay_ms)
    }

    /// Scan raw lines for a `User-agent` line matching `ua`, then look at
    /// subsequent lines up to the next blank/comment/User-agent line for
    /// `Disallow: /` or `Allow: /` (spec.md §4.2, literal wording).
    pub fn ai_bot_access(&self, ua: &str) -> AccessState {
        let mut i = 0;
        while i < self.raw_lines.len() {
            let line = &self.raw_lines[i];
            if let Some((key, value)) = directive(line) {
                if key == "user-agent" && value.eq_ignore_ascii_case(ua) {
                    let mut j = i + 1;
                    while j < self.raw_lines.len() {
                        let next = &self.raw_lines[j];
                        let trimmed = next.split('#').next().unwrap_or("").trim();
                        if trimmed.is_empty() {
                            break;
                        }
                        if let Some((k2, v2)) = directive(next) {
                            if k2 == "user-agent" {
                                break;
                            }
                            if k2 == "disallow" && v2 == "/" {
                                return AccessState::ExplicitlyDisallowed;
                            }
                            if k2 == "allow" && v2 == "/" {
                                return AccessState::ExplicitlyAllowed;
                            }
                        }
                        j += 1;
                    }
                }
            }
            i += 1;
        }
        AccessState::Unmentioned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissive_when_body_empty() {
        let rules = RobotsRules::parse("");
        assert!(rules.is_allowed("AuditCrawlBot", "https://ex.test/admin/x"));
    }

    #[test]
    fn disallows_matching_prefix() {
        let body = "User-agent: *\nDisallow: /admin/\n";
        let rules = RobotsRules::parse(body);
        assert!(!rules.is_allowed("AuditCrawlBot", "https://ex.test/admin/x"));
        assert!(rules.is_allowed("AuditCrawlBot", "https://ex.test/about"));
    }

    #[test]
    fn allow_wins_on_equal_length_tie() {
        let body = "User-agent: *\nDisallow: /x\nAllow: /x\n";
        let rules = RobotsRules::parse(body);
        assert!(rules.is_allowed("AuditCrawlBot", "https://ex.test/x"));
    }

    #[test]
    fn longer_rule_wins_over_shorter() {
        let body = "User-agent: *\nDisallow: /\nAllow: /public/\n";
        let rules = RobotsRules::parse(body);
        assert!(rules.is_allowed("AuditCrawlBot", "https://ex.test/public/page"));
        assert!(!rules.is_allowed("AuditCrawlBot", "https://ex.test/private"));
    }

    #[test]
    fn crawl_delay_parsed_for_matching_agent() {
        let body = "User-agent: AuditCrawlBot\nCrawl-delay: 2\n";
        let rules = RobotsRules::parse(body);
        assert_eq!(rules.crawl_delay_ms("AuditCrawlBot"), Some(2000));
    }

    #[test]
    fn sitemap_directives_collected_in_order() {
        let body = "Sitemap: https://ex.test/sitemap1.xml\nSitemap: https://ex.test/sitemap2.xml\n";
        let rules = RobotsRules::parse(body);
        assert_eq!(
            rules.sitemaps,
            vec![
                "https://ex.test/sitemap1.xml".to_string(),
                "https://ex.test/sitemap2.xml".to_string()
            ]
        );
    }

    #[test]
    fn ai_bot_tri_state_classification() {
        let body = "\
User-agent: GPTBot\nDisallow: /\n\nUser-agent: PerplexityBot\nAllow: /\n\nUser-agent: *\nDisallow: /admin/\n";
        let rules = RobotsRules::parse(body);
        assert_eq!(rules.ai_bot_access("GPTBot"), AccessState::ExplicitlyDisallowed);
        assert_eq!(
            rules.ai_bot_access("PerplexityBot"),
            AccessState::ExplicitlyAllowed
        );
        assert_eq!(rules.ai_bot_access("Amazonbot"), AccessState::Unmentioned);
    }
}
