//! Heading collection: trimmed `h1`/`h2` text plus the document-order list of
//! heading tag names, used for hierarchy-skip checking (spec.md §4.5
//! "Headings", §4.6 content family "heading hierarchy skip > 1 level").

use scraper::{Html, Selector};

#[derive(Debug, Clone, Default)]
pub struct HeadingData {
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub h1_count: u32,
    pub h2_count: u32,
    /// Document-order tag names, e.g. `["h1", "h3", "h2"]`.
    pub tag_order: Vec<String>,
}

pub fn extract(document: &Html) -> HeadingData {
    let mut h1_tags = Vec::new();
    let mut h2_tags = Vec::new();
    let mut tag_order = Vec::new();

    let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") else {
        return HeadingData::default();
    };

    for element in document.select(&selector) {
        let tag = element.value().name().to_lowercase();
        let text = element.text().collect::<String>().trim().to_string();
        match tag.as_str() {
            "h1" => h1_tags.push(text),
            "h2" => h2_tags.push(text),
            _ => {}
        }
        tag_order.push(tag);
    }

    HeadingData {
        h1_count: h1_tags.len() as u32,
        h2_count: h2_tags.len() as u32,
        h1_tags,
        h2_tags,
        tag_order,
    }
}

/// Greatest single jump (in heading level) between two consecutive headings
/// in document order, e.g. `h1` -> `h3` is a skip of 2.
pub fn max_hierarchy_skip(tag_order: &[String]) -> u32 {
    let levels: Vec<u32> = tag_order
        .iter()
        .filter_map(|t| t.strip_prefix('h').and_then(|n| n.parse().ok()))
        .collect();

    levels
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_h1_and_h2_in_order() {
        let html = "<body><h1>One</h1><h3>Skip</h3><h2>Two</h2></body>";
        let doc = Html::parse_document(html);
        let data = extract(&doc);
        assert_eq!(data.h1_tags, vec!["One".to_string()]);
        assert_eq!(data.h2_tags, vec!["Two".to_string()]);
        assert_eq!(data.tag_order, vec!["h1", "h3", "h2"]);
    }

    #[test]
    fn hierarchy_skip_detects_level_jumps() {
        assert_eq!(
            max_hierarchy_skip(&["h1".into(), "h3".into(), "h4".into()]),
            2
        );
        assert_eq!(max_hierarchy_skip(&["h1".into(), "h2".into()]), 1);
        assert_eq!(max_hierarchy_skip(&["h1".into()]), 0);
    }
}
