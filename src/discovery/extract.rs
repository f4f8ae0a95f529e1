//! Link harvesting and filtering for discovered pages.

use scraper::{Html, Selector};
use url::Url;

/// Href values that are never links worth resolving.
const SKIP_PREFIXES: &[&str] = &["#", "javascript:", "mailto:", "tel:"];

/// Harvest hyperlinks from `a`, `area` and `link` tags in document
/// order, resolved to absolute URLs against `base`, fragments stripped.
/// Only http(s) results are returned; duplicates within the page are
/// kept so callers can count them.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href], area[href], link[href]").unwrap();

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let href = element.value().attr("href").unwrap_or("").trim();
        if href.is_empty() || SKIP_PREFIXES.iter().any(|p| href.starts_with(p)) {
            continue;
        }

        let mut resolved = match base.join(href) {
            Ok(u) => u,
            Err(_) => continue,
        };
        resolved.set_fragment(None);

        if resolved.scheme() == "http" || resolved.scheme() == "https" {
            links.push(resolved);
        }
    }
    links
}

/// Does the URL path end in one of the excluded suffixes? Both sides
/// are compared case-insensitively, so `.PDF` matches `.pdf`.
pub fn is_excluded_extension(url: &Url, excluded: &[String]) -> bool {
    let path = url.path().to_ascii_lowercase();
    excluded
        .iter()
        .any(|ext| path.ends_with(&ext.to_ascii_lowercase()))
}

/// Same host and port as the root. Scheme is deliberately ignored, so
/// an http link on an https site still counts as on-site.
pub fn same_site(url: &Url, root: &Url) -> bool {
    url.host_str() == root.host_str() && url.port() == root.port()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.test/docs/index.html").unwrap()
    }

    #[test]
    fn test_extract_preserves_document_order() {
        let html = r##"
            <html><body>
                <a href="/first">1</a>
                <area href="/second">
                <a href="third.html">3</a>
                <link href="/styles-page">
            </body></html>
        "##;
        let links = extract_links(html, &base());
        let as_strings: Vec<String> = links.iter().map(|u| u.to_string()).collect();
        assert_eq!(
            as_strings,
            vec![
                "https://example.test/first",
                "https://example.test/second",
                "https://example.test/docs/third.html",
                "https://example.test/styles-page",
            ]
        );
    }

    #[test]
    fn test_extract_skips_non_navigable_hrefs() {
        let html = r##"
            <a href="#section">anchor</a>
            <a href="javascript:void(0)">js</a>
            <a href="mailto:x@example.test">mail</a>
            <a href="tel:+15551234">tel</a>
            <a href="">empty</a>
            <a href="   ">blank</a>
            <a href="/kept">kept</a>
        "##;
        let links = extract_links(html, &base());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://example.test/kept");
    }

    #[test]
    fn test_extract_strips_fragments_and_foreign_schemes() {
        let html = r##"
            <a href="/page#section">fragment</a>
            <a href="ftp://example.test/file">ftp</a>
            <a href="data:text/html,hi">data</a>
            <a href="http://other.test/x">offsite-but-http</a>
        "##;
        let links = extract_links(html, &base());
        let as_strings: Vec<&str> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            as_strings,
            vec!["https://example.test/page", "http://other.test/x"]
        );
    }

    #[test]
    fn test_extract_keeps_duplicates_within_page() {
        let html = r#"<a href="/a">one</a><a href="/a">two</a>"#;
        assert_eq!(extract_links(html, &base()).len(), 2);
    }

    #[test]
    fn test_excluded_extension_is_case_insensitive() {
        let excluded = vec![".pdf".to_string(), ".jpg".to_string()];

        let pdf = Url::parse("https://example.test/report.PDF").unwrap();
        assert!(is_excluded_extension(&pdf, &excluded));

        let mixed = Url::parse("https://example.test/photo.Jpg").unwrap();
        assert!(is_excluded_extension(&mixed, &excluded));

        // Query strings don't hide the extension.
        let with_query = Url::parse("https://example.test/doc.pdf?download=1").unwrap();
        assert!(is_excluded_extension(&with_query, &excluded));

        let page = Url::parse("https://example.test/pdf-guide").unwrap();
        assert!(!is_excluded_extension(&page, &excluded));
    }

    #[test]
    fn test_same_site_compares_host_and_port() {
        let root = Url::parse("https://example.test/").unwrap();

        let on_site = Url::parse("https://example.test/a/b").unwrap();
        assert!(same_site(&on_site, &root));

        // Scheme difference alone doesn't make it off-site.
        let http = Url::parse("http://example.test/a").unwrap();
        assert!(same_site(&http, &root));

        let subdomain = Url::parse("https://www.example.test/").unwrap();
        assert!(!same_site(&subdomain, &root));

        let other_port = Url::parse("https://example.test:8443/").unwrap();
        assert!(!same_site(&other_port, &root));
    }
}
