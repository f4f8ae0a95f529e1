//! HTML → markdown conversion for fetched documents.
//!
//! Conversion never fails a fetch: a document that cannot be converted
//! keeps its raw markup and gets an empty markdown payload.

/// Convert an HTML document to markdown. Degrades to an empty string
/// on converter errors rather than propagating them.
pub fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_headings_and_links() {
        let html = r#"<html><body><h1>Title</h1><p>Some <a href="https://example.com/x">link</a> text.</p></body></html>"#;
        let md = html_to_markdown(html);
        assert!(md.contains("# Title"));
        assert!(md.contains("[link](https://example.com/x)"));
    }

    #[test]
    fn test_empty_input_yields_empty_markdown() {
        assert_eq!(html_to_markdown(""), "");
    }

    #[test]
    fn test_script_and_style_are_dropped() {
        let html = "<html><head><style>body{color:red}</style></head>\
                    <body><script>alert(1)</script><p>visible</p></body></html>";
        let md = html_to_markdown(html);
        assert!(md.contains("visible"));
        assert!(!md.contains("alert"));
        assert!(!md.contains("color:red"));
    }
}
