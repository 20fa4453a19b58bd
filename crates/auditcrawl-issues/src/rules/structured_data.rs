//! Article and Product validation over the raw JSON-LD entries the
//! extractor keeps in `PageRecord::analysis.structured_data` (spec.md §4.5
//! "Article extraction" / "Product extraction").

use auditcrawl_types::page::PageRecord;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

fn entry_types(entry: &Value) -> Vec<String> {
    match entry.get("@type") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(arr)) => arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

fn offer_price(offers: &Value) -> (Option<f64>, Option<String>, Option<String>, Option<String>) {
    let price = offers
        .get("price")
        .and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())));
    let currency = offers
        .get("priceCurrency")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let availability = offers
        .get("availability")
        .and_then(|v| v.as_str())
        .map(|s| s.rsplit('/').next().unwrap_or(s).to_string());
    let valid_until = offers
        .get("priceValidUntil")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    (price, currency, availability, valid_until)
}

fn detect_product(entry: &Value, now: DateTime<Utc>, out: &mut Vec<(String, Value)>) {
    if entry.get("name").is_none() {
        out.push(("product_missing_name".to_string(), json!({})));
    }
    if entry.get("brand").is_none() {
        out.push(("product_missing_brand".to_string(), json!({})));
    }

    let Some(offers) = entry.get("offers") else {
        out.push(("product_missing_offer".to_string(), json!({})));
        return;
    };

    let (price, currency, availability, valid_until) = offer_price(offers);

    if price.is_none() {
        out.push(("product_missing_price".to_string(), json!({})));
    } else if let Some(p) = price {
        if p < 0.0 {
            out.push(("product_invalid_price".to_string(), json!({ "price": p })));
        }
    }

    if currency.is_none() {
        out.push(("product_missing_currency".to_string(), json!({})));
    }

    match &availability {
        None => out.push(("product_missing_availability".to_string(), json!({}))),
        Some(a) => {
            let lower = a.to_lowercase();
            if lower.contains("outofstock") || lower.contains("discontinued") {
                out.push(("product_out_of_stock".to_string(), json!({ "availability": a })));
            }
        }
    }

    if let Some(valid_until) = valid_until {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&valid_until) {
            if parsed.with_timezone(&Utc) < now {
                out.push(("product_price_expired".to_string(), json!({ "valid_until": valid_until })));
            }
        }
    }
}

fn detect_article(entry: &Value, now: DateTime<Utc>, out: &mut Vec<(String, Value)>) {
    for field in ["headline", "datePublished"] {
        if entry.get(field).is_none() {
            out.push((format!("article_missing_{field}"), json!({})));
        }
    }

    if let Some(headline) = entry.get("headline").and_then(|v| v.as_str()) {
        let len = headline.chars().count();
        if len < 30 {
            out.push(("article_headline_too_short".to_string(), json!({ "length": len })));
        } else if len > 110 {
            out.push(("article_headline_too_long".to_string(), json!({ "length": len })));
        }
    }

    if let Some(published) = entry.get("datePublished").and_then(|v| v.as_str()) {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(published) {
            let parsed = parsed.with_timezone(&Utc);
            if parsed > now {
                out.push(("article_date_in_future".to_string(), json!({ "date_published": published })));
            } else if now.signed_duration_since(parsed).num_days() > 365 * 2
                && entry.get("dateModified").is_none()
            {
                out.push(("article_outdated".to_string(), json!({ "date_published": published })));
            }
        }
    }

    if entry.get("articleBody").is_some() && entry.get("wordCount").is_none() {
        out.push(("article_missing_word_count".to_string(), json!({})));
    }
}

pub fn detect(page: &PageRecord, now: DateTime<Utc>) -> Vec<(String, Value)> {
    let Some(entries) = page.analysis.get("structured_data").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut article_count = 0;
    let mut product_count = 0;

    for entry in entries {
        let types = entry_types(entry);
        if types.iter().any(|t| matches!(t.as_str(), "Article" | "NewsArticle" | "BlogPosting" | "TechArticle" | "ScholarlyArticle")) {
            article_count += 1;
            detect_article(entry, now, &mut out);
        }
        if types.iter().any(|t| t == "Product") {
            product_count += 1;
            detect_product(entry, now, &mut out);
        }
    }

    if article_count > 1 {
        out.push(("article_multiple_on_page".to_string(), json!({ "count": article_count })));
    }
    if product_count > 1 {
        out.push(("product_multiple_on_page".to_string(), json!({ "count": product_count })));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::job::DiscoverySource;
    use uuid::Uuid;

    fn page_with_structured_data(entries: Value) -> PageRecord {
        let mut page = PageRecord::minimal(
            Uuid::new_v4(),
            "https://ex.test/".to_string(),
            200,
            Some("text/html".to_string()),
            100,
            "ok",
            0,
            DiscoverySource::Seed,
        );
        page.analysis = json!({ "structured_data": entries });
        page
    }

    #[test]
    fn flags_invalid_out_of_stock_expired_and_missing_brand_product() {
        let entries = json!([{
            "@type": "Product",
            "name": "Widget",
            "offers": {
                "price": -5,
                "priceCurrency": "USD",
                "availability": "https://schema.org/OutOfStock",
                "priceValidUntil": "2000-01-01T00:00:00Z"
            }
        }]);
        let page = page_with_structured_data(entries);
        let now = Utc::now();
        let issues = detect(&page, now);
        let codes: Vec<&str> = issues.iter().map(|(c, _)| c.as_str()).collect();
        assert!(codes.contains(&"product_invalid_price"));
        assert!(codes.contains(&"product_out_of_stock"));
        assert!(codes.contains(&"product_price_expired"));
        assert!(codes.contains(&"product_missing_brand"));
    }

    #[test]
    fn well_formed_article_passes() {
        let entries = json!([{
            "@type": "Article",
            "headline": "A reasonably long and descriptive headline here",
            "datePublished": "2024-01-01T00:00:00Z",
            "dateModified": "2024-06-01T00:00:00Z"
        }]);
        let page = page_with_structured_data(entries);
        let now = Utc::now();
        let issues = detect(&page, now);
        assert!(issues.is_empty());
    }
}
