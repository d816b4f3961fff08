//! Fetched pages and the queries the spiders run against them.

use crate::request::{FetchRequest, Stage};
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

/// A fetched response with its parsed document body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub status: u16,
    document: Html,
}

impl FetchedPage {
    /// Parse a response body fetched from `url`
    #[must_use]
    pub fn parse(url: Url, status: u16, body: &str) -> Self {
        Self {
            url,
            status,
            document: Html::parse_document(body),
        }
    }

    /// All elements matching a CSS selector, in document order.
    /// An invalid selector matches nothing.
    #[must_use]
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        compile(css).map_or_else(Vec::new, |selector| {
            self.document.select(&selector).collect()
        })
    }

    /// Attribute of the first matching element that carries it
    #[must_use]
    pub fn attr(&self, css: &str, name: &str) -> Option<String> {
        self.select(css)
            .into_iter()
            .find_map(|element| element.value().attr(name).map(ToString::to_string))
    }

    /// The attribute from every matching element that carries it
    #[must_use]
    pub fn attrs(&self, css: &str, name: &str) -> Vec<String> {
        self.select(css)
            .into_iter()
            .filter_map(|element| element.value().attr(name).map(ToString::to_string))
            .collect()
    }

    /// `content` of `<meta name=...>`
    #[must_use]
    pub fn meta_name(&self, name: &str) -> Option<String> {
        self.attr(&format!(r#"meta[name="{name}"]"#), "content")
    }

    /// `content` of every `<meta name=...>`, for repeated tags
    #[must_use]
    pub fn meta_names(&self, name: &str) -> Vec<String> {
        self.attrs(&format!(r#"meta[name="{name}"]"#), "content")
    }

    /// `content` of `<meta property=...>`
    #[must_use]
    pub fn meta_property(&self, property: &str) -> Option<String> {
        self.attr(&format!(r#"meta[property="{property}"]"#), "content")
    }

    /// Resolve a link against this page's URL
    #[must_use]
    pub fn urljoin(&self, href: &str) -> Option<Url> {
        match self.url.join(href.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Could not resolve link {} against {}: {}", href, self.url, e);
                None
            }
        }
    }

    /// Build a follow-up request for a link found on this page
    #[must_use]
    pub fn follow(&self, href: &str, stage: Stage) -> Option<FetchRequest> {
        self.urljoin(href).map(|url| FetchRequest::new(url, stage))
    }
}

/// Run a CSS selector inside one element
#[must_use]
pub fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    compile(css).map_or_else(Vec::new, |selector| element.select(&selector).collect())
}

/// Text nodes that are direct children of the element
#[must_use]
pub fn own_text(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|child| child.value().as_text().map(|text| text.to_string()))
        .collect()
}

/// Concatenated text of the element and all of its descendants
#[must_use]
pub fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Direct child elements with the given tag name
pub fn child_elements<'a>(
    element: ElementRef<'a>,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

/// Sibling elements after this one with the given tag name
pub fn following_siblings<'a>(
    element: ElementRef<'a>,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(move |sibling| sibling.value().name() == tag)
}

/// Parse an HTML fragment and return its plain text
#[must_use]
pub fn flatten_fragment(html: &str) -> String {
    Html::parse_fragment(html).root_element().text().collect()
}

fn compile(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Invalid CSS selector {:?}: {:?}", css, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> FetchedPage {
        FetchedPage::parse(
            Url::parse("https://www.example.org/papers/index.html").unwrap(),
            200,
            body,
        )
    }

    #[test]
    fn test_attr_and_meta_lookup() {
        let page = page(
            r#"<html><head>
                <meta name="citation_author" content="Alice A.">
                <meta name="citation_author" content="Bob B.">
                <meta property="og:title" content="Title">
            </head><body><a class="x">no href</a><a class="x" href="/a">A</a></body></html>"#,
        );

        assert_eq!(page.attr("a.x", "href").as_deref(), Some("/a"));
        assert_eq!(page.meta_names("citation_author"), vec!["Alice A.", "Bob B."]);
        assert_eq!(page.meta_property("og:title").as_deref(), Some("Title"));
        assert!(page.meta_name("citation_pdf_url").is_none());
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let page = page("<p>text</p>");
        assert!(page.select("p[").is_empty());
        assert!(page.attr("p[", "href").is_none());
    }

    #[test]
    fn test_urljoin_relative_and_absolute() {
        let page = page("");
        assert_eq!(
            page.urljoin("../files/a.pdf").unwrap().as_str(),
            "https://www.example.org/files/a.pdf"
        );
        assert_eq!(
            page.urljoin("https://cdn.example.net/b.pdf").unwrap().as_str(),
            "https://cdn.example.net/b.pdf"
        );
    }

    #[test]
    fn test_own_text_skips_nested_elements() {
        let page = page("<p>Hello <b>bold</b> world</p>");
        let paragraph = page.select("p")[0];
        assert_eq!(own_text(paragraph), vec!["Hello ", " world"]);
        assert_eq!(text_content(paragraph), "Hello bold world");
    }

    #[test]
    fn test_sibling_and_child_navigation() {
        let page = page(
            "<div><h2>Abstract</h2><p>one</p><span>x</span><p>two</p></div>\
             <a href='/x'><strong>Read More</strong></a>",
        );
        let heading = page.select("h2")[0];
        let paragraphs: Vec<String> = following_siblings(heading, "p").map(text_content).collect();
        assert_eq!(paragraphs, vec!["one", "two"]);

        let anchor = page.select("a")[0];
        assert_eq!(child_elements(anchor, "strong").count(), 1);
    }

    #[test]
    fn test_flatten_fragment() {
        assert_eq!(
            flatten_fragment("<p>Alice <i>Smith</i>, <em>Uni</em></p>"),
            "Alice Smith, Uni"
        );
    }
}
