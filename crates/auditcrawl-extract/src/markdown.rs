//! Body-to-Markdown rendering (spec.md §4.5a): a lightweight reader view of
//! the page used for downstream summarization, not full-fidelity Markdown.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "nav", "footer", "header"];

static BOILERPLATE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(accept (all )?cookies|we use cookies|cookie (policy|consent)|subscribe to our newsletter|all rights reserved|skip to (main )?content)\b").unwrap()
});

static CONSENT_CLASS_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)cookie|consent|gdpr|newsletter-popup").unwrap());

fn is_consent_container(element: &ElementRef) -> bool {
    let classes = element.value().attr("class").unwrap_or_default();
    let id = element.value().attr("id").unwrap_or_default();
    CONSENT_CLASS_ID.is_match(classes) || CONSENT_CLASS_ID.is_match(id)
}

fn render_node(node: ego_tree::NodeRef<Node>, out: &mut String, list_depth: usize) {
    let Some(element) = ElementRef::wrap(node) else {
        if let Node::Text(text) = node.value() {
            out.push_str(&text.text);
        }
        return;
    };

    let tag = element.value().name();
    if NON_CONTENT_TAGS.contains(&tag) {
        return;
    }
    if is_consent_container(&element) {
        return;
    }

    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1).min(6);
            out.push('\n');
            out.push_str(&"#".repeat(level));
            out.push(' ');
            out.push_str(element.text().collect::<String>().trim());
            out.push('\n');
        }
        "p" => {
            out.push('\n');
            for child in node.children() {
                render_node(child, out, list_depth);
            }
            out.push('\n');
        }
        "li" => {
            out.push('\n');
            out.push_str(&"  ".repeat(list_depth));
            out.push_str("- ");
            for child in node.children() {
                render_node(child, out, list_depth + 1);
            }
        }
        "ul" | "ol" => {
            for child in node.children() {
                render_node(child, out, list_depth);
            }
            out.push('\n');
        }
        "blockquote" => {
            out.push('\n');
            out.push_str("> ");
            out.push_str(element.text().collect::<String>().trim());
            out.push('\n');
        }
        "br" => out.push('\n'),
        _ => {
            for child in node.children() {
                render_node(child, out, list_depth);
            }
        }
    }
}

/// Collapse runs of 3+ blank lines to a single blank line and strip lines
/// matching common cookie-banner / boilerplate phrasing.
fn clean(raw: &str) -> String {
    let mut blank_run = 0;
    let mut lines = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if BOILERPLATE_LINE.is_match(trimmed) {
            continue;
        }
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(trimmed.to_string());
    }
    lines.join("\n").trim().to_string()
}

pub fn to_markdown(document: &Html) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let mut raw = String::new();
    for child in body.children() {
        render_node(child, &mut raw, 0);
    }
    clean(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_paragraphs() {
        let html = "<body><h1>Title</h1><p>Paragraph text.</p></body>";
        let doc = Html::parse_document(html);
        let md = to_markdown(&doc);
        assert!(md.contains("# Title"));
        assert!(md.contains("Paragraph text."));
    }

    #[test]
    fn drops_cookie_consent_containers() {
        let html = r#"<body><div class="cookie-banner">Accept all cookies to continue</div><p>Real content</p></body>"#;
        let doc = Html::parse_document(html);
        let md = to_markdown(&doc);
        assert!(!md.to_lowercase().contains("cookie"));
        assert!(md.contains("Real content"));
    }

    #[test]
    fn renders_list_items_with_dash_prefix() {
        let html = "<body><ul><li>One</li><li>Two</li></ul></body>";
        let doc = Html::parse_document(html);
        let md = to_markdown(&doc);
        assert!(md.contains("- One"));
        assert!(md.contains("- Two"));
    }
}
