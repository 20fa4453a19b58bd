//! Link collection: internal/external anchors, deduplicated in first-seen
//! order (spec.md §4.5 "Links").

use scraper::{Html, Selector};
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct LinkSets {
    pub internal: Vec<String>,
    pub external: Vec<String>,
    pub internal_count: u32,
    pub external_count: u32,
}

/// `domain` and `host` match if equal, or if one is a subdomain of the other
/// (`www.` is treated as equivalent to the bare host).
fn same_site(host: &str, project_domain: &str) -> bool {
    let strip_www = |h: &str| h.strip_prefix("www.").unwrap_or(h).to_string();
    let host = strip_www(host);
    let domain = strip_www(project_domain);
    host == domain || host.ends_with(&format!(".{domain}"))
}

pub fn extract(document: &Html, base: Option<&Url>, project_domain: &str) -> LinkSets {
    let mut internal = Vec::new();
    let mut external = Vec::new();
    let mut seen_internal = std::collections::HashSet::new();
    let mut seen_external = std::collections::HashSet::new();

    let Ok(selector) = Selector::parse("a[href]") else {
        return LinkSets::default();
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") {
            continue;
        }

        let resolved = match base {
            Some(b) => b.join(href).ok(),
            None => Url::parse(href).ok(),
        };

        let Some(mut resolved) = resolved else {
            continue;
        };
        resolved.set_fragment(None);
        let resolved_str = resolved.to_string();

        let is_internal = resolved
            .host_str()
            .map(|h| same_site(h, project_domain))
            .unwrap_or(false);

        if is_internal {
            if seen_internal.insert(resolved_str.clone()) {
                internal.push(resolved_str);
            }
        } else if seen_external.insert(resolved_str.clone()) {
            external.push(resolved_str);
        }
    }

    LinkSets {
        internal_count: internal.len() as u32,
        external_count: external.len() as u32,
        internal,
        external,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_internal_and_external_links() {
        let html = r#"<body>
            <a href="/a">A</a>
            <a href="https://ex.test/b">B</a>
            <a href="https://www.ex.test/c">C</a>
            <a href="https://other.test/x">X</a>
            <a href="#frag">Frag</a>
        </body>"#;
        let doc = Html::parse_document(html);
        let base = Url::parse("https://ex.test/page").unwrap();
        let sets = extract(&doc, Some(&base), "ex.test");
        assert_eq!(sets.internal_count, 3);
        assert_eq!(sets.external_count, 1);
    }

    #[test]
    fn dedupes_repeated_links() {
        let html = r#"<body><a href="/a">1</a><a href="/a">2</a></body>"#;
        let doc = Html::parse_document(html);
        let base = Url::parse("https://ex.test/page").unwrap();
        let sets = extract(&doc, Some(&base), "ex.test");
        assert_eq!(sets.internal_count, 1);
    }
}
