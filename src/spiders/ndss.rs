//! NDSS Symposium.
//!
//! The archive page links each year; a year page may link a separate
//! "Accepted Papers" page or list the papers itself. Detail-page markup
//! changed over the years, so each field has its own fallback chain.

use super::{parse_seed, Spider, SpiderArgs, SpiderOutput};
use crate::extract::{
    clean_extra_whitespaces, clean_quotes, non_blank, non_empty,
    normalize_space, FallbackChain, Rule,
};
use crate::page::{child_elements, following_siblings, own_text, text_content, FetchedPage};
use crate::record::{PaperContext, SourceTag};
use crate::request::{FetchRequest, Stage};
use crate::Result;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

const ARCHIVE_URL: &str = "https://www.ndss-symposium.org/previous-ndss-symposia/";
const TITLE_SUFFIX: &str = "- NDSS Symposium";
const AUTHORS_LABEL: &str = "Author(s):";

/// Source id downstream storage uses for NDSS
pub const NDSS_SOURCE_ID: u32 = 13;

pub struct NdssSpider {
    conference: String,
    year: String,
}

impl NdssSpider {
    pub const NAME: &'static str = "ndss";

    /// Create the spider. The year is required.
    pub fn new(args: &SpiderArgs) -> Result<Self> {
        let year = args.require_year(Self::NAME)?;
        Ok(Self {
            conference: args.conference_or(Self::NAME),
            year,
        })
    }

    /// Find the archive link for the configured year
    pub fn handle_landing(&self, page: &FetchedPage) -> Vec<SpiderOutput> {
        info!("Searching for year {} on {}", self.year, page.url);

        let year_link = page
            .select(r#"a[class*="wp-block-button__link"]"#)
            .into_iter()
            .filter(|anchor| normalize_space(&text_content(*anchor)) == self.year)
            .find_map(|anchor| anchor.value().attr("href"));

        match year_link.and_then(|href| page.follow(href, Stage::YearPage)) {
            Some(request) => {
                info!("Found link for {}: {}", self.year, request.url);
                vec![SpiderOutput::Follow(request)]
            }
            None => {
                error!(
                    "Could not find a link for the year {} on {}",
                    self.year, page.url
                );
                Vec::new()
            }
        }
    }

    /// Follow the "Accepted Papers" link, or treat this page as the list
    pub fn handle_year_page(&self, page: &FetchedPage) -> Vec<SpiderOutput> {
        info!("Searching for 'Accepted Papers' link on {}", page.url);

        let accepted = page.select("a").into_iter().find_map(|anchor| {
            let has_label = child_elements(anchor, "strong")
                .any(|strong| text_content(strong).contains("Accepted Papers"));
            if has_label {
                anchor.value().attr("href")
            } else {
                None
            }
        });

        if let Some(request) = accepted.and_then(|href| page.follow(href, Stage::PaperList)) {
            debug!("Following accepted papers link {}", request.url);
            return vec![SpiderOutput::Follow(request)];
        }

        warn!(
            "No 'Accepted Papers' link found on {}. Assuming this is the paper list page.",
            page.url
        );
        self.handle_paper_list(page)
    }

    /// Fan out to every paper detail page
    pub fn handle_paper_list(&self, page: &FetchedPage) -> Vec<SpiderOutput> {
        info!("Parsing paper list on {}", page.url);

        let Some(links) = DETAIL_LINKS.resolve(page) else {
            error!(
                "Could not find any paper detail links on {}. Stopping this branch.",
                page.url
            );
            return Vec::new();
        };

        info!("Found {} paper links to follow", links.len());
        links
            .iter()
            .filter_map(|href| page.follow(href, Stage::PaperDetail))
            .map(SpiderOutput::Follow)
            .collect()
    }

    /// Extract one record from a paper detail page
    pub fn handle_paper_detail(&self, page: &FetchedPage) -> Vec<SpiderOutput> {
        info!("Extracting details from {}", page.url);

        let title = TITLE
            .resolve(page)
            .map(|title| clean_quotes(title.replace(TITLE_SUFFIX, "").trim()))
            .unwrap_or_default();
        let authors = AUTHORS
            .resolve(page)
            .map(|authors| authors.trim().to_string())
            .unwrap_or_default();
        let abstract_text = ABSTRACT
            .resolve(page)
            .map(|parts| clean_extra_whitespaces(&parts.join(" ")))
            .unwrap_or_default();
        let pdf_url = PDF_URL
            .resolve(page)
            .and_then(|href| page.urljoin(&href))
            .map(String::from);

        if pdf_url.is_none() {
            debug!("No PDF link on {}", page.url);
        }

        let context = PaperContext {
            title,
            authors,
            abstract_text,
            abstract_url: page.url.to_string(),
        };
        vec![SpiderOutput::Record(
            context.into_record(pdf_url, SourceTag::Id(NDSS_SOURCE_ID)),
        )]
    }
}

impl Spider for NdssSpider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn conference(&self) -> &str {
        &self.conference
    }

    fn year(&self) -> &str {
        &self.year
    }

    fn seed(&self) -> Vec<FetchRequest> {
        info!("Start scraping {} for {}", ARCHIVE_URL, self.year);
        parse_seed(ARCHIVE_URL)
            .map(|url| FetchRequest::new(url, Stage::Landing))
            .into_iter()
            .collect()
    }

    fn handle(&self, page: &FetchedPage, request: &FetchRequest) -> Vec<SpiderOutput> {
        match request.stage {
            Stage::Landing => self.handle_landing(page),
            Stage::YearPage => self.handle_year_page(page),
            Stage::PaperList => self.handle_paper_list(page),
            Stage::PaperDetail => self.handle_paper_detail(page),
            other => {
                warn!("{} spider has no handler for stage {}", Self::NAME, other);
                Vec::new()
            }
        }
    }
}

static DETAIL_LINKS: FallbackChain<Vec<String>> = FallbackChain {
    field: "detail_links",
    rules: &[
        Rule {
            name: "paper-link-abs",
            extract: links_paper_link_abs,
        },
        Rule {
            name: "read-more",
            extract: links_read_more,
        },
    ],
};

static TITLE: FallbackChain<String> = FallbackChain {
    field: "title",
    rules: &[Rule {
        name: "og:title",
        extract: title_og,
    }],
};

static AUTHORS: FallbackChain<String> = FallbackChain {
    field: "authors",
    rules: &[
        Rule {
            name: "bold-paragraph",
            extract: authors_bold_paragraph,
        },
        Rule {
            name: "ndss_authors",
            extract: authors_container,
        },
    ],
};

static ABSTRACT: FallbackChain<Vec<String>> = FallbackChain {
    field: "abstract",
    rules: &[
        Rule {
            name: "after-strong",
            extract: abstract_after_strong,
        },
        Rule {
            name: "after-abstract-heading",
            extract: abstract_after_heading,
        },
    ],
};

static PDF_URL: FallbackChain<String> = FallbackChain {
    field: "pdf_url",
    rules: &[
        Rule {
            name: "pdf-button",
            extract: pdf_button,
        },
        Rule {
            name: "ndss_downloads",
            extract: pdf_downloads,
        },
    ],
};

fn links_paper_link_abs(page: &FetchedPage) -> Option<Vec<String>> {
    non_empty(page.attrs(r#"a[class="paper-link-abs"]"#, "href"))
}

fn links_read_more(page: &FetchedPage) -> Option<Vec<String>> {
    let links = page
        .select("a")
        .into_iter()
        .filter(|anchor| {
            child_elements(*anchor, "strong").any(|strong| text_content(strong) == "Read More")
        })
        .filter_map(|anchor| anchor.value().attr("href").map(ToString::to_string))
        .collect();
    non_empty(links)
}

fn title_og(page: &FetchedPage) -> Option<String> {
    page.meta_property("og:title").and_then(non_blank)
}

/// First text of a bold paragraph, accepted only when it looks like an
/// author line: those carry affiliations in parentheses.
fn authors_bold_paragraph(page: &FetchedPage) -> Option<String> {
    page.select("p > strong")
        .into_iter()
        .find_map(|strong| own_text(strong).into_iter().next())
        .filter(|text| text.contains('('))
}

fn authors_container(page: &FetchedPage) -> Option<String> {
    let raw: String = page
        .select(r#"p[class="ndss_authors"]"#)
        .into_iter()
        .map(text_content)
        .collect();
    non_blank(raw.replace(AUTHORS_LABEL, "").trim().to_string())
}

fn abstract_after_strong(page: &FetchedPage) -> Option<Vec<String>> {
    paragraph_text(page.select("strong ~ p"))
}

fn abstract_after_heading(page: &FetchedPage) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    let paragraphs = page
        .select("h2")
        .into_iter()
        .filter(|heading| own_text(*heading).iter().any(|t| t.contains("Abstract")))
        .flat_map(|heading| following_siblings(heading, "p"))
        .filter(|p| seen.insert(p.id()))
        .collect();
    paragraph_text(paragraphs)
}

/// Trimmed direct text of each paragraph; `None` when nothing is visible
fn paragraph_text(paragraphs: Vec<scraper::ElementRef<'_>>) -> Option<Vec<String>> {
    let parts: Vec<String> = paragraphs
        .into_iter()
        .flat_map(own_text)
        .map(|text| text.trim().to_string())
        .collect();
    if parts.iter().all(String::is_empty) {
        None
    } else {
        Some(parts)
    }
}

fn pdf_button(page: &FetchedPage) -> Option<String> {
    page.attr(r#"a[class*="pdf-button"]"#, "href").and_then(non_blank)
}

fn pdf_downloads(page: &FetchedPage) -> Option<String> {
    page.attr(r#"p[class="ndss_downloads"] a"#, "href")
        .and_then(non_blank)
}
