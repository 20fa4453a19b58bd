//! URL Normalizer & SEO Filter (spec.md §4.1).
//!
//! `normalize` canonicalizes a URL for deduplication (P1: idempotent).
//! `is_seo_relevant` decides whether a URL is worth admitting to the
//! frontier at all (P7: filter soundness over the fixed tables below).

/// Non-HTML file extensions the crawler never bothers fetching.
const NON_HTML_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".bmp", ".tiff",
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
    ".zip", ".rar", ".7z", ".tar", ".gz", ".tar.gz",
    ".mp3", ".mp4", ".avi", ".mov", ".wmv", ".webm", ".flv",
    ".js", ".css", ".json", ".xml", ".rss",
    ".woff", ".woff2", ".ttf", ".eot", ".otf",
    ".exe", ".dmg", ".apk", ".iso",
];

/// Path segments that, if present anywhere in the path (exact, case-insensitive
/// segment match), mark the URL as not worth crawling.
const EXCLUDED_PATH_SEGMENTS: &[&str] = &[
    "admin", "login", "logout", "signin", "signup", "register",
    "cart", "checkout", "account", "my-account",
    "search", "feed", "rss", "api", "tag", "tags", "author",
    "wp-admin", "wp-login", "cgi-bin", "ajax", "print",
];

/// Path substrings (not necessarily whole segments) that exclude a URL.
const EXCLUDED_PATH_SUBSTRINGS: &[&str] = &["/wp-content/uploads", "/wp-json/"];

/// Query-string keys that mark a URL as a tracking/pagination/session
/// variant of a canonical page rather than a distinct page worth crawling.
const EXCLUDED_QUERY_KEYS: &[&str] = &[
    "fbclid", "gclid", "msclkid", "sessionid", "sid", "phpsessid",
    "page", "p", "offset", "sort", "order", "filter",
    "t", "_", "q", "s",
];

fn is_excluded_query_key(key: &str) -> bool {
    let key = key.to_lowercase();
    key.starts_with("utm_") || EXCLUDED_QUERY_KEYS.contains(&key.as_str())
}

/// Canonicalize a URL: drop the fragment, sort query parameters ascending by
/// key, lower-case the host, and strip a trailing slash unless the path is
/// exactly `/`. Returns `None` for an unparseable URL.
pub fn normalize(url: &str) -> Option<String> {
    let mut parsed = url::Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    parsed.set_fragment(None);

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    let host = parsed.host_str()?.to_lowercase();
    parsed.set_host(Some(&host)).ok()?;

    if parsed.path().len() > 1 && parsed.path().ends_with('/') {
        let trimmed = parsed.path().trim_end_matches('/').to_string();
        parsed.set_path(&trimmed);
    }

    Some(parsed.to_string())
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Domain comparison helper: strips a leading `www.` (spec.md §4.1: "strip
/// `www.` for domain comparison (but preserve in URL)").
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Reason a URL was rejected by [`is_seo_relevant`], or `Ok(())` if it passed.
pub type SeoRelevance = Result<(), String>;

/// `IsSeoRelevant(url) -> (bool, reason)` (spec.md §4.1). Checks run in a
/// fixed order so the first matching reason is reported; all path
/// comparisons are case-insensitive.
pub fn is_seo_relevant(url: &str) -> SeoRelevance {
    let parsed = url::Url::parse(url).map_err(|_| "invalid URL".to_string())?;
    let path = parsed.path().to_lowercase();

    if let Some(ext) = NON_HTML_EXTENSIONS.iter().find(|ext| path.ends_with(*ext)) {
        return Err(format!("non-HTML file extension: {ext}"));
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(seg) = segments.iter().find(|s| EXCLUDED_PATH_SEGMENTS.contains(s)) {
        return Err(format!("excluded path segment: {seg}"));
    }

    if let Some(sub) = EXCLUDED_PATH_SUBSTRINGS.iter().find(|sub| path.contains(**sub)) {
        return Err(format!("excluded path pattern: {sub}"));
    }

    if let Some((key, _)) = parsed.query_pairs().find(|(k, _)| is_excluded_query_key(k)) {
        return Err(format!("excluded query parameter: {key}"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_fragment_and_sorts_query() {
        let a = normalize("https://Ex.test/page?b=2&a=1#section").unwrap();
        let b = normalize("https://ex.test/page?a=1&b=2").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn normalize_strips_trailing_slash_except_root() {
        assert_eq!(normalize("https://ex.test/about/").unwrap(), "https://ex.test/about");
        assert_eq!(normalize("https://ex.test/").unwrap(), "https://ex.test/");
    }

    #[test]
    fn normalize_is_idempotent() {
        for url in ["https://Ex.test/a/?z=1&a=2#x", "https://ex.test/"] {
            let once = normalize(url).unwrap();
            let twice = normalize(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert!(normalize("not a url").is_none());
        assert!(normalize("ftp://ex.test/a").is_none());
    }

    #[test]
    fn seo_relevant_rejects_non_html_extensions() {
        assert!(is_seo_relevant("https://ex.test/image.JPG").is_err());
        assert!(is_seo_relevant("https://ex.test/style.css").is_err());
        assert!(is_seo_relevant("https://ex.test/doc.pdf").is_err());
    }

    #[test]
    fn seo_relevant_rejects_excluded_segments_case_insensitively() {
        assert!(is_seo_relevant("https://ex.test/Admin/users").is_err());
        assert!(is_seo_relevant("https://ex.test/blog/tag/rust").is_err());
    }

    #[test]
    fn seo_relevant_rejects_excluded_query_keys() {
        assert!(is_seo_relevant("https://ex.test/about?utm_source=newsletter").is_err());
        assert!(is_seo_relevant("https://ex.test/blog?page=2").is_err());
        assert!(is_seo_relevant("https://ex.test/products?sort=price").is_err());
    }

    #[test]
    fn seo_relevant_accepts_plain_content_urls() {
        assert!(is_seo_relevant("https://ex.test/about").is_ok());
        assert!(is_seo_relevant("https://ex.test/blog/my-post").is_ok());
    }

    #[test]
    fn trailing_slash_and_utm_variants_normalize_to_distinct_but_comparable_urls() {
        let plain = normalize("https://ex.test/about").unwrap();
        let tracked = normalize("https://ex.test/about?utm_source=x").unwrap();
        assert_ne!(plain, tracked);
        assert!(is_seo_relevant("https://ex.test/about?utm_source=x").is_err());
    }
}
