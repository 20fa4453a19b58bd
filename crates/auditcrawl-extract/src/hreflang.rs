//! Hreflang annotation extraction and validation (spec.md §4.5 "Hreflang"):
//! language/region whitelist checks, duplicate detection, self-reference,
//! and `x-default` handling.

use auditcrawl_types::ports::extractor::HreflangTag;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use url::Url;

/// ISO 639-1 subset covering the languages this pipeline expects to see in
/// practice; an unrecognized code is flagged but not dropped.
const KNOWN_LANGS: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "nl", "ru", "zh", "ja", "ko", "ar", "hi", "pl", "tr", "sv",
    "da", "fi", "no", "cs", "el", "he", "id", "th", "vi", "uk", "ro", "hu",
];

fn is_known_lang(code: &str) -> bool {
    let primary = code.split('-').next().unwrap_or(code).to_lowercase();
    KNOWN_LANGS.contains(&primary.as_str())
}

pub fn extract(document: &Html, base: Option<&Url>, _final_url: &str, warnings: &mut Vec<String>) -> Vec<HreflangTag> {
    let Ok(selector) = Selector::parse(r#"link[rel="alternate"][hreflang]"#) else {
        return Vec::new();
    };

    let mut tags = Vec::new();
    for element in document.select(&selector) {
        let Some(hreflang) = element.value().attr("hreflang") else {
            continue;
        };
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let resolved = match base {
            Some(b) => b.join(href).map(|u| u.to_string()).unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        };

        let is_x_default = hreflang.eq_ignore_ascii_case("x-default");
        let (lang, region) = if is_x_default {
            (String::new(), None)
        } else {
            let mut parts = hreflang.splitn(2, '-');
            let lang = parts.next().unwrap_or_default().to_lowercase();
            let region = parts.next().map(|r| r.to_uppercase());
            (lang, region)
        };

        if !is_x_default && !is_known_lang(&lang) {
            warnings.push(format!("unrecognized hreflang language code '{lang}'"));
        }

        tags.push(HreflangTag {
            lang,
            region,
            href: resolved,
            is_x_default,
        });
    }

    tags
}

/// Cross-checks the tag set for duplicates and self-reference, returning a
/// JSON summary embedded in the page's analysis payload.
pub fn validate(tags: &[HreflangTag], final_url: &str) -> Value {
    let mut seen = std::collections::HashSet::new();
    let mut duplicates = Vec::new();
    for tag in tags {
        let key = if tag.is_x_default {
            "x-default".to_string()
        } else {
            format!("{}-{}", tag.lang, tag.region.clone().unwrap_or_default())
        };
        if !seen.insert(key.clone()) {
            duplicates.push(key);
        }
    }

    let has_self_reference = tags.iter().any(|t| t.href.trim_end_matches('/') == final_url.trim_end_matches('/'));
    let has_x_default = tags.iter().any(|t| t.is_x_default);

    json!({
        "tag_count": tags.len(),
        "duplicates": duplicates,
        "has_self_reference": tags.is_empty() || has_self_reference,
        "has_x_default": has_x_default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_lang_and_region() {
        let html = r#"<head><link rel="alternate" hreflang="en-US" href="https://ex.test/us"></head>"#;
        let doc = Html::parse_document(html);
        let base = Url::parse("https://ex.test/").unwrap();
        let mut warnings = Vec::new();
        let tags = extract(&doc, Some(&base), "https://ex.test/", &mut warnings);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].lang, "en");
        assert_eq!(tags[0].region.as_deref(), Some("US"));
    }

    #[test]
    fn flags_unknown_language_codes() {
        let html = r#"<head><link rel="alternate" hreflang="zz" href="https://ex.test/zz"></head>"#;
        let doc = Html::parse_document(html);
        let mut warnings = Vec::new();
        extract(&doc, None, "https://ex.test/", &mut warnings);
        assert!(warnings.iter().any(|w| w.contains("zz")));
    }

    #[test]
    fn detects_duplicate_tags() {
        let tags = vec![
            HreflangTag { lang: "en".into(), region: None, href: "https://ex.test/en".into(), is_x_default: false },
            HreflangTag { lang: "en".into(), region: None, href: "https://ex.test/en2".into(), is_x_default: false },
        ];
        let result = validate(&tags, "https://ex.test/");
        assert_eq!(result["duplicates"].as_array().unwrap().len(), 1);
    }
}
