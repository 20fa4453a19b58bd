//! Structured data extraction: JSON-LD (`application/ld+json`), microdata
//! `itemtype` presence, and Article/Product field validation (spec.md §4.5
//! "Structured data").

use scraper::{Html, Selector};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct StructuredDataResult {
    pub schema_types: Vec<String>,
    pub payload: Value,
}

fn schema_type_name(raw: &str) -> String {
    raw.rsplit('/').next().unwrap_or(raw).to_string()
}

fn collect_types_from_node(node: &Value, types: &mut Vec<String>, entries: &mut Vec<Value>) {
    match node {
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph").and_then(|g| g.as_array()) {
                for item in graph {
                    collect_types_from_node(item, types, entries);
                }
                return;
            }

            if let Some(ty) = map.get("@type") {
                match ty {
                    Value::String(s) => types.push(schema_type_name(s)),
                    Value::Array(arr) => {
                        for v in arr {
                            if let Some(s) = v.as_str() {
                                types.push(schema_type_name(s));
                            }
                        }
                    }
                    _ => {}
                }
                entries.push(node.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_types_from_node(item, types, entries);
            }
        }
        _ => {}
    }
}

fn validate_article(entry: &Value, warnings: &mut Vec<String>) {
    for field in ["headline", "datePublished", "author"] {
        if entry.get(field).is_none() {
            warnings.push(format!("Article structured data missing required field '{field}'"));
        }
    }
}

fn validate_product(entry: &Value, warnings: &mut Vec<String>) {
    for field in ["name", "offers"] {
        if entry.get(field).is_none() {
            warnings.push(format!("Product structured data missing required field '{field}'"));
        }
    }
}

pub fn extract(document: &Html, warnings: &mut Vec<String>) -> StructuredDataResult {
    let mut schema_types: Vec<String> = Vec::new();
    let mut entries: Vec<Value> = Vec::new();

    if let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) {
        for element in document.select(&selector) {
            let raw = element.text().collect::<String>();
            match serde_json::from_str::<Value>(&raw) {
                Ok(parsed) => collect_types_from_node(&parsed, &mut schema_types, &mut entries),
                Err(e) => warnings.push(format!("invalid JSON-LD block: {e}")),
            }
        }
    }

    if let Ok(selector) = Selector::parse("[itemtype]") {
        for element in document.select(&selector) {
            if let Some(itemtype) = element.value().attr("itemtype") {
                schema_types.push(schema_type_name(itemtype));
            }
        }
    }

    schema_types.sort();
    schema_types.dedup();

    for entry in &entries {
        let types: Vec<String> = entry
            .get("@type")
            .map(|t| match t {
                Value::String(s) => vec![schema_type_name(s)],
                Value::Array(arr) => arr.iter().filter_map(|v| v.as_str()).map(schema_type_name).collect(),
                _ => Vec::new(),
            })
            .unwrap_or_default();

        if types.iter().any(|t| t == "Article" || t == "NewsArticle" || t == "BlogPosting") {
            validate_article(entry, warnings);
        }
        if types.iter().any(|t| t == "Product") {
            validate_product(entry, warnings);
        }
    }

    StructuredDataResult {
        schema_types,
        payload: Value::Array(entries),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_jsonld_type() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@context":"https://schema.org","@type":"Article","headline":"Hi","datePublished":"2024-01-01","author":"Jane"}
        </script></head></html>"#;
        let doc = Html::parse_document(html);
        let mut warnings = Vec::new();
        let result = extract(&doc, &mut warnings);
        assert_eq!(result.schema_types, vec!["Article".to_string()]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn flags_incomplete_article() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"Article","headline":"Hi"}
        </script></head></html>"#;
        let doc = Html::parse_document(html);
        let mut warnings = Vec::new();
        extract(&doc, &mut warnings);
        assert!(warnings.iter().any(|w| w.contains("datePublished")));
    }

    #[test]
    fn detects_microdata_itemtype() {
        let html = r#"<body><div itemscope itemtype="https://schema.org/Product"></div></body>"#;
        let doc = Html::parse_document(html);
        let mut warnings = Vec::new();
        let result = extract(&doc, &mut warnings);
        assert_eq!(result.schema_types, vec!["Product".to_string()]);
    }
}
