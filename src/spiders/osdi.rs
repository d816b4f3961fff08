//! USENIX OSDI technical sessions.
//!
//! Paper pages carry Highwire-style `citation_*` meta tags, so extraction
//! is a straight read of those tags.

use super::{parse_seed, short_year, Spider, SpiderArgs, SpiderOutput};
use crate::extract::{clean_html_tags, non_blank};
use crate::page::FetchedPage;
use crate::record::{PaperContext, SourceTag};
use crate::request::{FetchRequest, Stage};
use tracing::{debug, info, warn};

const PRESENTATION_LINKS: &str = r#"a[href*="/presentation"]"#;
const AUTHOR_SEPARATOR: &str = ", ";

pub struct OsdiSpider {
    conference: String,
    year: String,
}

impl OsdiSpider {
    pub const NAME: &'static str = "osdi";
    pub const DEFAULT_YEAR: &'static str = "2023";

    #[must_use]
    pub fn new(args: &SpiderArgs) -> Self {
        Self {
            conference: args.conference_or(Self::NAME),
            year: args.year_or(Self::DEFAULT_YEAR),
        }
    }

    /// `https://www.usenix.org/conference/osdi23/technical-sessions`
    #[must_use]
    pub fn sessions_url(&self) -> String {
        format!(
            "https://www.usenix.org/conference/{}{}/technical-sessions",
            self.conference,
            short_year(&self.year)
        )
    }

    /// Fan out to every presentation, or read this page as a paper page
    /// when it links none.
    pub fn handle_session_page(&self, page: &FetchedPage) -> Vec<SpiderOutput> {
        info!("Successfully fetched page: {}", page.url);

        let links = page.attrs(PRESENTATION_LINKS, "href");
        if links.is_empty() {
            debug!("No presentation links on {}, reading it as a paper page", page.url);
            return self.handle_paper_page(page);
        }

        info!("Found {} research paper links", links.len());
        links
            .iter()
            .filter_map(|href| page.follow(href, Stage::PaperPage))
            .map(|request| SpiderOutput::Follow(request.dont_filter()))
            .collect()
    }

    /// Read the citation meta tags of one paper page
    pub fn handle_paper_page(&self, page: &FetchedPage) -> Vec<SpiderOutput> {
        let title = page
            .meta_name("citation_title")
            .map(|title| clean_html_tags(&title))
            .unwrap_or_default();
        let authors = page.meta_names("citation_author").join(AUTHOR_SEPARATOR);
        let abstract_text = page
            .meta_name("description")
            .map(|description| clean_html_tags(&description))
            .unwrap_or_default();
        let pdf_url = page
            .meta_name("citation_pdf_url")
            .and_then(non_blank)
            .and_then(|href| page.urljoin(&href))
            .map(String::from);

        if title.is_empty() {
            warn!("No citation_title on {}", page.url);
        }

        let context = PaperContext {
            title,
            authors,
            abstract_text,
            abstract_url: page.url.to_string(),
        };
        vec![SpiderOutput::Record(
            context.into_record(pdf_url, SourceTag::Url(page.url.to_string())),
        )]
    }
}

impl Spider for OsdiSpider {
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
        let url = self.sessions_url();
        info!("Start scraping {} for {}", url, self.year);
        parse_seed(&url)
            .map(|url| FetchRequest::new(url, Stage::SessionPage).dont_filter())
            .into_iter()
            .collect()
    }

    fn handle(&self, page: &FetchedPage, request: &FetchRequest) -> Vec<SpiderOutput> {
        match request.stage {
            Stage::SessionPage => self.handle_session_page(page),
            Stage::PaperPage => self.handle_paper_page(page),
            other => {
                warn!("{} spider has no handler for stage {}", Self::NAME, other);
                Vec::new()
            }
        }
    }
}
