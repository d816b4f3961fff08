//! USENIX Security accepted-papers listings.
//!
//! Each listing block already carries title, authors and abstract. Only the
//! PDF link lives on the presentation page, so the block's fields travel
//! with the follow-up request as a [`PaperContext`].

use super::{parse_seed, short_year, Spider, SpiderArgs, SpiderOutput};
use crate::extract::{non_blank, FallbackChain, Rule};
use crate::page::{flatten_fragment, own_text, select_within, text_content, FetchedPage};
use crate::record::{PaperContext, SourceTag};
use crate::request::{FetchRequest, Stage};
use scraper::ElementRef;
use tracing::{debug, info, warn};

const LISTINGS: &[&str] = &["summer-accepted-papers", "fall-accepted-papers"];
const PAPER_BLOCKS: &str = r#"article[class*="node-paper"]"#;
const TITLE_LINK: &str = "h2 > a";
const PEOPLE_FIELD: &str = r#"div[class*="field-name-field-paper-people-text"] p"#;
const DESCRIPTION_FIELD: &str = r#"div[class*="field-name-field-paper-description-long"] p"#;

/// Source id downstream storage uses for USENIX Security
pub const USENIX_SOURCE_ID: u32 = 12;

pub struct UsenixSpider {
    conference: String,
    year: String,
}

impl UsenixSpider {
    pub const NAME: &'static str = "usenix";
    pub const DEFAULT_CONFERENCE: &'static str = "usenixsecurity";
    pub const DEFAULT_YEAR: &'static str = "2024";

    #[must_use]
    pub fn new(args: &SpiderArgs) -> Self {
        Self {
            conference: args.conference_or(Self::DEFAULT_CONFERENCE),
            year: args.year_or(Self::DEFAULT_YEAR),
        }
    }

    /// The fixed listing pages for the configured year
    #[must_use]
    pub fn listing_urls(&self) -> Vec<String> {
        LISTINGS
            .iter()
            .map(|listing| {
                format!(
                    "https://www.usenix.org/conference/{}{}/{}",
                    self.conference,
                    short_year(&self.year),
                    listing
                )
            })
            .collect()
    }

    /// One follow-up per paper block, carrying the block's metadata
    pub fn handle_listing_page(&self, page: &FetchedPage) -> Vec<SpiderOutput> {
        info!("Successfully fetched page: {}", page.url);
        info!("Response status: {}", page.status);

        let blocks = page.select(PAPER_BLOCKS);
        info!("Found {} paper blocks", blocks.len());

        if blocks.is_empty() {
            warn!("No papers found on {}! Checking page structure...", page.url);
            info!("Found {} total articles", page.select("article").len());
            let sample: Vec<String> = page
                .select("h2")
                .into_iter()
                .take(5)
                .map(|heading| text_content(heading).trim().to_string())
                .collect();
            info!("Sample titles found: {:?}", sample);
        }

        blocks
            .into_iter()
            .filter_map(|block| Self::follow_block(page, block))
            .map(SpiderOutput::Follow)
            .collect()
    }

    fn follow_block(page: &FetchedPage, block: ElementRef<'_>) -> Option<FetchRequest> {
        let title_link = select_within(block, TITLE_LINK).into_iter().next();
        let title = title_link
            .and_then(|link| own_text(link).into_iter().next())
            .map(|title| title.trim().to_string())
            .unwrap_or_default();
        debug!("Processing paper: {}", title);

        let Some(href) = title_link.and_then(|link| link.value().attr("href")) else {
            warn!("No presentation URL found for paper: {}", title);
            return None;
        };
        let url = page.urljoin(href)?;
        info!("Following presentation URL: {}", url);

        let context = PaperContext {
            title,
            authors: flattened_field(block, PEOPLE_FIELD),
            abstract_text: flattened_field(block, DESCRIPTION_FIELD),
            abstract_url: url.to_string(),
        };
        Some(
            FetchRequest::new(url, Stage::PresentationPage)
                .with_context(context)
                .dont_filter(),
        )
    }

    /// Finish the carried record with the presentation page's PDF link
    pub fn handle_presentation_page(
        &self,
        page: &FetchedPage,
        context: Option<&PaperContext>,
    ) -> Vec<SpiderOutput> {
        info!("Processing presentation page: {}", page.url);

        let pdf_url = PDF_URL
            .resolve(page)
            .and_then(|href| page.urljoin(&href))
            .map(String::from);
        match &pdf_url {
            Some(url) => info!("Found PDF URL: {}", url),
            None => warn!("No PDF URL found for: {}", page.url),
        }

        let context = context.cloned().unwrap_or_else(|| {
            warn!("No carried context for {}, emitting PDF link only", page.url);
            PaperContext {
                abstract_url: page.url.to_string(),
                ..PaperContext::default()
            }
        });
        info!("Yielding item for: {}", context.title);
        vec![SpiderOutput::Record(
            context.into_record(pdf_url, SourceTag::Id(USENIX_SOURCE_ID)),
        )]
    }
}

impl Spider for UsenixSpider {
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
        self.listing_urls()
            .iter()
            .filter_map(|url| {
                info!("Start scraping {} for {}", url, self.year);
                parse_seed(url)
            })
            .map(|url| {
                FetchRequest::new(url, Stage::ListingPage)
                    .dont_filter()
                    .dont_redirect()
            })
            .collect()
    }

    fn handle(&self, page: &FetchedPage, request: &FetchRequest) -> Vec<SpiderOutput> {
        match request.stage {
            Stage::ListingPage => self.handle_listing_page(page),
            Stage::PresentationPage => {
                self.handle_presentation_page(page, request.context.as_ref())
            }
            other => {
                warn!("{} spider has no handler for stage {}", Self::NAME, other);
                Vec::new()
            }
        }
    }
}

/// Flatten the first paragraph of a field container to plain text. The
/// result is already entity-decoded.
fn flattened_field(block: ElementRef<'_>, css: &str) -> String {
    select_within(block, css)
        .into_iter()
        .next()
        .map(|paragraph| flatten_fragment(&paragraph.inner_html()).trim().to_string())
        .unwrap_or_default()
}

static PDF_URL: FallbackChain<String> = FallbackChain {
    field: "pdf_url",
    rules: &[
        Rule {
            name: "citation_pdf_url",
            extract: pdf_from_meta,
        },
        Rule {
            name: "final-paper-pdf",
            extract: pdf_from_final_paper_field,
        },
    ],
};

fn pdf_from_meta(page: &FetchedPage) -> Option<String> {
    page.meta_name("citation_pdf_url").and_then(non_blank)
}

fn pdf_from_final_paper_field(page: &FetchedPage) -> Option<String> {
    page.attr(r#"div[class*="field-name-field-final-paper-pdf"] a"#, "href")
        .and_then(non_blank)
}
