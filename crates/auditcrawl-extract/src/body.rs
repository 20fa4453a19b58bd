//! Plain-text derivation from the rendered DOM: word counts, text/HTML
//! ratio, and mixed-content detection (spec.md §4.5 "Body text").

use scraper::{Html, Selector};

const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Visible text with non-content tags stripped, collapsed to single spaces.
pub fn extract_plain_text(document: &Html) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&body_selector).next() else {
        return collapse_whitespace(&document.root_element().text().collect::<String>());
    };

    let skip_selector = NON_CONTENT_TAGS
        .iter()
        .map(|t| (*t).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let skip = Selector::parse(&skip_selector).ok();

    let skipped_texts: std::collections::HashSet<String> = skip
        .map(|sel| {
            body.select(&sel)
                .map(|e| e.text().collect::<String>())
                .collect()
        })
        .unwrap_or_default();

    let mut text = String::new();
    for chunk in body.text() {
        if skipped_texts.contains(chunk) {
            continue;
        }
        text.push_str(chunk);
        text.push(' ');
    }

    collapse_whitespace(&text)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_count(text: &str) -> u32 {
    text.split_whitespace().filter(|w| !w.is_empty()).count() as u32
}

/// Ratio of visible text bytes to total HTML bytes, used to flag thin or
/// markup-heavy pages.
pub fn text_to_html_ratio(text: &str, html: &str) -> f64 {
    if html.is_empty() {
        return 0.0;
    }
    text.len() as f64 / html.len() as f64
}

/// True if an HTTPS page references any `http://` resource (script/img/link
/// href or src), a mixed-content signal.
pub fn has_mixed_content(document: &Html, final_url: &str) -> bool {
    if !final_url.starts_with("https://") {
        return false;
    }
    let Ok(selector) = Selector::parse("script[src], img[src], link[href], iframe[src]") else {
        return false;
    };
    document.select(&selector).any(|e| {
        let attr = e.value().attr("src").or_else(|| e.value().attr("href"));
        attr.map(|v| v.starts_with("http://")).unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_and_styles_from_plain_text() {
        let html = "<body><script>var x = 1;</script><p>Hello world</p><style>.a{}</style></body>";
        let doc = Html::parse_document(html);
        let text = extract_plain_text(&doc);
        assert!(text.contains("Hello world"));
        assert!(!text.contains("var x"));
    }

    #[test]
    fn word_count_counts_whitespace_separated_tokens() {
        assert_eq!(word_count("one two  three"), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn detects_mixed_content_on_https_pages() {
        let html = r#"<body><script src="http://insecure.test/a.js"></script></body>"#;
        let doc = Html::parse_document(html);
        assert!(has_mixed_content(&doc, "https://ex.test/"));
        assert!(!has_mixed_content(&doc, "http://ex.test/"));
    }
}
