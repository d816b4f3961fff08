//! Fallback chains and text cleanup shared by the spiders.
//!
//! Site markup drifts between years, so every field is read through an
//! ordered list of rules. The first rule that yields a value wins; a chain
//! where every rule misses resolves to `None` and the caller picks the
//! default. Rules never fail loudly.

use crate::page::FetchedPage;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// One way of reading a value from a page
pub struct Rule<T> {
    pub name: &'static str,
    pub extract: fn(&FetchedPage) -> Option<T>,
}

/// Ordered rules for one field
pub struct FallbackChain<T: 'static> {
    pub field: &'static str,
    pub rules: &'static [Rule<T>],
}

impl<T: 'static> FallbackChain<T> {
    /// Try each rule in order until one yields a value
    pub fn resolve(&self, page: &FetchedPage) -> Option<T> {
        for (position, rule) in self.rules.iter().enumerate() {
            if let Some(value) = (rule.extract)(page) {
                debug!(
                    "{}: rule '{}' matched on {}",
                    self.field, rule.name, page.url
                );
                return Some(value);
            }
            if position + 1 < self.rules.len() {
                debug!(
                    "{}: rule '{}' missed on {}, falling back",
                    self.field, rule.name, page.url
                );
            }
        }
        debug!("{}: no rule matched on {}", self.field, page.url);
        None
    }

    /// Name of the first rule that yields a value, without keeping the value
    pub fn matching_rule(&self, page: &FetchedPage) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| (rule.extract)(page).is_some())
            .map(|rule| rule.name)
    }
}

/// `Some` only for strings with visible content
#[must_use]
pub fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// `Some` only for non-empty lists
#[must_use]
pub fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("Failed to compile tag regex"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

/// Strip markup tags, decode common entities, trim
#[must_use]
pub fn clean_html_tags(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, "");
    decode_entities(&stripped).trim().to_string()
}

/// Collapse whitespace runs into single spaces, trim
#[must_use]
pub fn clean_extra_whitespaces(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Replace typographic quotes with ASCII ones
#[must_use]
pub fn clean_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{00AB}'
            | '\u{00BB}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            other => other,
        })
        .collect()
}

/// XPath `normalize-space()`
#[must_use]
pub fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    // &amp; last so "&amp;lt;" stays "&lt;"
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn page(body: &str) -> FetchedPage {
        FetchedPage::parse(Url::parse("https://example.org/p").unwrap(), 200, body)
    }

    fn heading(page: &FetchedPage) -> Option<String> {
        page.select("h1")
            .first()
            .map(|h| h.text().collect::<String>())
            .and_then(non_blank)
    }

    fn og_title(page: &FetchedPage) -> Option<String> {
        page.meta_property("og:title").and_then(non_blank)
    }

    static TITLE: FallbackChain<String> = FallbackChain {
        field: "title",
        rules: &[
            Rule {
                name: "og:title",
                extract: og_title,
            },
            Rule {
                name: "h1",
                extract: heading,
            },
        ],
    };

    #[test]
    fn test_chain_prefers_first_rule() {
        let page = page(r#"<meta property="og:title" content="Meta"><h1>Heading</h1>"#);
        assert_eq!(TITLE.resolve(&page).as_deref(), Some("Meta"));
        assert_eq!(TITLE.matching_rule(&page), Some("og:title"));
    }

    #[test]
    fn test_chain_falls_back() {
        let page = page(r#"<meta property="og:title" content="  "><h1>Heading</h1>"#);
        assert_eq!(TITLE.resolve(&page).as_deref(), Some("Heading"));
        assert_eq!(TITLE.matching_rule(&page), Some("h1"));
    }

    #[test]
    fn test_chain_exhausted() {
        let page = page("<p>nothing here</p>");
        assert!(TITLE.resolve(&page).is_none());
        assert!(TITLE.matching_rule(&page).is_none());
    }

    #[test]
    fn test_clean_html_tags() {
        assert_eq!(
            clean_html_tags("  <b>Alice</b> &amp; <i>Bob</i> "),
            "Alice & Bob"
        );
        assert_eq!(clean_html_tags("a &lt;b&gt; c"), "a <b> c");
    }

    #[test]
    fn test_clean_html_tags_keeps_comparisons() {
        assert_eq!(
            clean_html_tags("<p>if a &lt; b and c &gt; d</p>"),
            "if a < b and c > d"
        );
        assert_eq!(clean_html_tags("if a < b and c > d"), "if a < b and c > d");
        assert_eq!(clean_html_tags("x <= 3 <br/>"), "x <= 3");
    }

    #[test]
    fn test_clean_extra_whitespaces() {
        assert_eq!(
            clean_extra_whitespaces("  We\n  present\t\tX.  "),
            "We present X."
        );
    }

    #[test]
    fn test_clean_quotes() {
        assert_eq!(
            clean_quotes("\u{201C}Smart\u{201D} isn\u{2019}t \u{2018}safe\u{2019}"),
            "\"Smart\" isn't 'safe'"
        );
    }

    #[test]
    fn test_normalize_space() {
        assert_eq!(normalize_space("\n  2024 \n"), "2024");
        assert_eq!(normalize_space("NDSS   2024"), "NDSS 2024");
    }
}
