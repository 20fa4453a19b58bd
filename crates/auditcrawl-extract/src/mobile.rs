//! Mobile-friendliness heuristics (spec.md §4.5 "Mobile signals"): viewport
//! configuration, zoom-disabling, responsive media, and tap-target-adjacent
//! checks, approximated without an actual rendered layout.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}").unwrap());

#[derive(Debug, Clone, Serialize)]
pub struct MobileAnalysis {
    pub has_viewport: bool,
    pub viewport_disables_zoom: bool,
    pub has_media_queries: bool,
    pub unresponsive_image_count: u32,
    pub unresponsive_table_count: u32,
    pub has_fixed_position_elements: bool,
    pub phone_numbers_not_linked: u32,
    pub lazy_loaded_above_fold_images: u32,
}

impl MobileAnalysis {
    /// A page is considered mobile-friendly if it declares a viewport that
    /// does not disable zoom and does not rely on fixed-width images/tables
    /// without any responsive media-query handling.
    pub fn is_mobile_friendly(&self) -> bool {
        self.has_viewport
            && !self.viewport_disables_zoom
            && (self.unresponsive_image_count == 0 || self.has_media_queries)
            && !self.has_fixed_position_elements
    }
}

fn viewport_disables_zoom(content: &str) -> bool {
    let lower = content.to_lowercase();
    lower.contains("user-scalable=no")
        || lower.contains("user-scalable=0")
        || lower
            .split(',')
            .filter_map(|part| part.trim().strip_prefix("maximum-scale="))
            .any(|v| v.trim().parse::<f64>().map(|scale| scale < 2.0).unwrap_or(false))
}

pub fn analyze(document: &Html, body_text: &str) -> MobileAnalysis {
    let viewport_content = Selector::parse("meta[name='viewport']").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .and_then(|e| e.value().attr("content"))
            .map(|s| s.to_string())
    });

    let has_viewport = viewport_content.is_some();
    let viewport_disables_zoom = viewport_content
        .as_deref()
        .map(viewport_disables_zoom)
        .unwrap_or(false);

    let has_media_queries = Selector::parse("style")
        .ok()
        .map(|sel| {
            document
                .select(&sel)
                .any(|e| e.text().collect::<String>().contains("@media"))
        })
        .unwrap_or(false);

    let unresponsive_image_count = Selector::parse("img")
        .ok()
        .map(|sel| {
            document
                .select(&sel)
                .filter(|e| {
                    let has_width_attr = e.value().attr("width").is_some();
                    let style_has_fixed_width = e
                        .value()
                        .attr("style")
                        .map(|s| s.contains("width:") && !s.contains('%'))
                        .unwrap_or(false);
                    let responsive = e.value().attr("srcset").is_some()
                        || e.value()
                            .attr("style")
                            .map(|s| s.contains("max-width"))
                            .unwrap_or(false);
                    (has_width_attr || style_has_fixed_width) && !responsive
                })
                .count() as u32
        })
        .unwrap_or(0);

    let unresponsive_table_count = Selector::parse("table")
        .ok()
        .map(|sel| {
            document
                .select(&sel)
                .filter(|e| {
                    e.value()
                        .attr("width")
                        .map(|w| !w.contains('%'))
                        .unwrap_or(false)
                })
                .count() as u32
        })
        .unwrap_or(0);

    let has_fixed_position_elements = Selector::parse("[style*='position:fixed'], [style*='position: fixed']")
        .ok()
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false);

    let linked_phone_count = Selector::parse("a[href^='tel:']")
        .ok()
        .map(|sel| document.select(&sel).count())
        .unwrap_or(0);
    let plain_phone_matches = PHONE_PATTERN.find_iter(body_text).count();
    let phone_numbers_not_linked = plain_phone_matches.saturating_sub(linked_phone_count) as u32;

    let lazy_loaded_above_fold_images = Selector::parse("img[loading='lazy']")
        .ok()
        .map(|sel| document.select(&sel).take(3).count() as u32)
        .unwrap_or(0);

    MobileAnalysis {
        has_viewport,
        viewport_disables_zoom,
        has_media_queries,
        unresponsive_image_count,
        unresponsive_table_count,
        has_fixed_position_elements,
        phone_numbers_not_linked,
        lazy_loaded_above_fold_images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_viewport_is_not_mobile_friendly() {
        let doc = Html::parse_document("<html><head></head><body></body></html>");
        let analysis = analyze(&doc, "");
        assert!(!analysis.has_viewport);
        assert!(!analysis.is_mobile_friendly());
    }

    #[test]
    fn detects_zoom_disabled_viewport() {
        let html = r#"<head><meta name="viewport" content="width=device-width, user-scalable=no"></head>"#;
        let doc = Html::parse_document(html);
        let analysis = analyze(&doc, "");
        assert!(analysis.viewport_disables_zoom);
        assert!(!analysis.is_mobile_friendly());
    }

    #[test]
    fn well_configured_viewport_is_mobile_friendly() {
        let html = r#"<head><meta name="viewport" content="width=device-width, initial-scale=1"></head>"#;
        let doc = Html::parse_document(html);
        let analysis = analyze(&doc, "");
        assert!(analysis.is_mobile_friendly());
    }
}
