//! Head signals: title, meta description/robots, canonical, lang, viewport,
//! theme color, icon/manifest presence, Open Graph / Twitter card
//! (spec.md §4.5 "Head signals").

use scraper::{Html, Selector};

#[derive(Debug, Clone, Default)]
pub struct HeadSignals {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    /// `robots` meta content, falling back to `googlebot` if `robots` is
    /// absent.
    pub robots_meta: Option<String>,
    pub canonical_url: Option<String>,
    pub html_lang: Option<String>,
    pub viewport: Option<String>,
    pub theme_color: Option<String>,
    pub has_apple_touch_icon: bool,
    pub has_manifest: bool,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub twitter_card: Option<String>,
}

fn meta_content(document: &Html, attr: &str, value: &str) -> Option<String> {
    let selector_str = format!("meta[{attr}='{value}']");
    let selector = Selector::parse(&selector_str).ok()?;
    document
        .select(&selector)
        .next()?
        .value()
        .attr("content")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn extract(document: &Html, _final_url: &str) -> HeadSignals {
    let title = Selector::parse("title").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    });

    let meta_description = meta_content(document, "name", "description");

    let robots_meta =
        meta_content(document, "name", "robots").or_else(|| meta_content(document, "name", "googlebot"));

    let canonical_url = Selector::parse("link[rel='canonical']").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .and_then(|e| e.value().attr("href"))
            .map(|s| s.to_string())
    });

    let html_lang = Selector::parse("html").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .and_then(|e| e.value().attr("lang"))
            .map(|s| s.to_string())
    });

    let viewport = meta_content(document, "name", "viewport");
    let theme_color = meta_content(document, "name", "theme-color");

    let has_apple_touch_icon = Selector::parse("link[rel='apple-touch-icon']")
        .ok()
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false);

    let has_manifest = Selector::parse("link[rel='manifest']")
        .ok()
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false);

    let og_title = meta_content(document, "property", "og:title");
    let og_description = meta_content(document, "property", "og:description");
    let og_image = meta_content(document, "property", "og:image");
    let twitter_card = meta_content(document, "name", "twitter:card");

    HeadSignals {
        title,
        meta_description,
        robots_meta,
        canonical_url,
        html_lang,
        viewport,
        theme_color,
        has_apple_touch_icon,
        has_manifest,
        og_title,
        og_description,
        og_image,
        twitter_card,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robots_falls_back_to_googlebot() {
        let html = r#"<html><head><meta name="googlebot" content="noindex"></head></html>"#;
        let doc = Html::parse_document(html);
        let signals = extract(&doc, "https://ex.test/");
        assert_eq!(signals.robots_meta.as_deref(), Some("noindex"));
    }

    #[test]
    fn title_is_trimmed() {
        let html = "<html><head><title>  Padded Title  </title></head></html>";
        let doc = Html::parse_document(html);
        let signals = extract(&doc, "https://ex.test/");
        assert_eq!(signals.title.as_deref(), Some("Padded Title"));
    }

    #[test]
    fn detects_icon_and_manifest_presence() {
        let html = r#"<html><head>
            <link rel="apple-touch-icon" href="/icon.png">
            <link rel="manifest" href="/manifest.json">
        </head></html>"#;
        let doc = Html::parse_document(html);
        let signals = extract(&doc, "https://ex.test/");
        assert!(signals.has_apple_touch_icon);
        assert!(signals.has_manifest);
    }
}
