//! Image alt-text auditing (spec.md §4.5 "Images").

use scraper::{Html, Selector};

#[derive(Debug, Clone, Default)]
pub struct ImageStats {
    pub total: u32,
    pub without_alt: u32,
    pub with_empty_alt: u32,
}

pub fn extract(document: &Html) -> ImageStats {
    let Ok(selector) = Selector::parse("img") else {
        return ImageStats::default();
    };

    let mut stats = ImageStats::default();
    for element in document.select(&selector) {
        stats.total += 1;
        match element.value().attr("alt") {
            None => stats.without_alt += 1,
            Some(alt) if alt.trim().is_empty() => stats.with_empty_alt += 1,
            Some(_) => {}
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_missing_and_empty_alt() {
        let html = r#"<body>
            <img src="a.png" alt="a cat">
            <img src="b.png">
            <img src="c.png" alt="">
        </body>"#;
        let doc = Html::parse_document(html);
        let stats = extract(&doc);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.without_alt, 1);
        assert_eq!(stats.with_empty_alt, 1);
    }
}
