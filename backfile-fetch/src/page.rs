//! HTML extraction: anchors out of a parsed page, plain text out of an
//! article, and href resolution against the page the href came from.

use crate::error::{FetchError, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Anchor hrefs in document order, trimmed, empty hrefs dropped.
/// Duplicates are kept; the page said it twice, the record says it twice.
///
/// With a `scope` selector only anchors inside matching containers are
/// returned, e.g. `Some("ul.list16")` for the review-list block.
pub fn extract_links(document: &Html, scope: Option<&str>) -> Result<Vec<String>> {
    let anchor = Selector::parse("a[href]").unwrap();
    let mut links = Vec::new();

    match scope {
        Some(css) => {
            let container = Selector::parse(css)
                .map_err(|e| FetchError::InvalidSelector(format!("{css}: {e}")))?;
            for scoped in document.select(&container) {
                collect_hrefs(scoped.select(&anchor), &mut links);
            }
        }
        None => {
            collect_hrefs(document.select(&anchor), &mut links);
        }
    }

    Ok(links)
}

fn collect_hrefs<'a>(elements: impl Iterator<Item = ElementRef<'a>>, links: &mut Vec<String>) {
    for element in elements {
        if let Some(href) = element.value().attr("href") {
            let href = href.trim();
            if !href.is_empty() {
                links.push(href.to_string());
            }
        }
    }
}

/// Whether `css` parses as a selector, for validating user input before a
/// whole batch trips over it.
pub fn is_valid_selector(css: &str) -> bool {
    Selector::parse(css).is_ok()
}

/// Every text node of the document joined with single spaces, runs of
/// whitespace collapsed. Markup-free, not reader-grade.
pub fn extract_text(document: &Html) -> String {
    let mut out = String::new();
    for chunk in document.root_element().text() {
        for word in chunk.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

/// Resolves an extracted href against the page it appeared on. Returns
/// `None` for hrefs that are not fetchable pages: empty, javascript:,
/// mailto:, tel:, bare fragments, and anything that resolves to a
/// non-http(s) scheme. Fragments are stripped from the result.
pub fn resolve_link(base: &str, href: &str) -> Option<String> {
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    resolved.set_fragment(None);

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_extract_links_document_order() {
        let document = parse(
            r#"<html><body>
                <a href="/first">one</a>
                <p><a href="http://other.example/second">two</a></p>
                <a href="third.html">three</a>
            </body></html>"#,
        );

        let links = extract_links(&document, None).unwrap();
        assert_eq!(
            links,
            vec!["/first", "http://other.example/second", "third.html"]
        );
    }

    #[test]
    fn test_extract_links_keeps_duplicates() {
        let document = parse(
            r#"<html><body>
                <a href="/a">a</a>
                <a href="/a">a again</a>
            </body></html>"#,
        );

        let links = extract_links(&document, None).unwrap();
        assert_eq!(links, vec!["/a", "/a"]);
    }

    #[test]
    fn test_extract_links_skips_empty_and_trims() {
        let document = parse(
            r#"<html><body>
                <a href="">nothing</a>
                <a href="   ">blank</a>
                <a href="  /padded  ">padded</a>
            </body></html>"#,
        );

        let links = extract_links(&document, None).unwrap();
        assert_eq!(links, vec!["/padded"]);
    }

    #[test]
    fn test_extract_links_anchor_without_href_ignored() {
        let document = parse(r#"<html><body><a name="top">anchor</a></body></html>"#);
        assert!(extract_links(&document, None).unwrap().is_empty());
    }

    #[test]
    fn test_extract_links_scoped_to_container() {
        let document = parse(
            r#"<html><body>
                <a href="/nav">navigation</a>
                <ul class="list16">
                    <li><a href="/review/1">r1</a></li>
                    <li><a href="/review/2">r2</a></li>
                </ul>
                <a href="/footer">footer</a>
            </body></html>"#,
        );

        let links = extract_links(&document, Some("ul.list16")).unwrap();
        assert_eq!(links, vec!["/review/1", "/review/2"]);
    }

    #[test]
    fn test_extract_links_scope_matching_nothing() {
        let document = parse(r#"<html><body><a href="/a">a</a></body></html>"#);
        assert!(extract_links(&document, Some("div.absent")).unwrap().is_empty());
    }

    #[test]
    fn test_extract_links_invalid_scope_is_an_error() {
        let document = parse("<html><body></body></html>");
        let result = extract_links(&document, Some("ul..broken"));
        assert!(matches!(result, Err(FetchError::InvalidSelector(_))));
        assert!(!is_valid_selector("ul..broken"));
        assert!(is_valid_selector("ul.list16"));
    }

    #[test]
    fn test_extract_text_simple_page() {
        let document = parse("<html><body><p>Some contents</p></body></html>");
        assert_eq!(extract_text(&document), "Some contents");
    }

    #[test]
    fn test_extract_text_collapses_whitespace() {
        let document = parse(
            "<html><body><h1>Title</h1>\n\n  <p>First   line.</p>\n<p>Second line.</p></body></html>",
        );
        assert_eq!(extract_text(&document), "Title First line. Second line.");
    }

    #[test]
    fn test_resolve_link_relative() {
        assert_eq!(
            resolve_link("http://example.com/reviews/index.html", "article1.html"),
            Some("http://example.com/reviews/article1.html".to_string())
        );
        assert_eq!(
            resolve_link("http://example.com/reviews/index.html", "/top.html"),
            Some("http://example.com/top.html".to_string())
        );
    }

    #[test]
    fn test_resolve_link_absolute_passthrough() {
        assert_eq!(
            resolve_link("http://example.com/", "https://other.example/a"),
            Some("https://other.example/a".to_string())
        );
    }

    #[test]
    fn test_resolve_link_strips_fragment() {
        assert_eq!(
            resolve_link("http://example.com/", "/page#section"),
            Some("http://example.com/page".to_string())
        );
    }

    #[test]
    fn test_resolve_link_skips_non_pages() {
        let base = "http://example.com/";
        assert_eq!(resolve_link(base, ""), None);
        assert_eq!(resolve_link(base, "#top"), None);
        assert_eq!(resolve_link(base, "javascript:void(0)"), None);
        assert_eq!(resolve_link(base, "mailto:someone@example.com"), None);
        assert_eq!(resolve_link(base, "tel:+15550100"), None);
        assert_eq!(resolve_link(base, "ftp://example.com/file"), None);
    }

    #[test]
    fn test_resolve_link_bad_base() {
        assert_eq!(resolve_link("not a base", "/a"), None);
    }
}
