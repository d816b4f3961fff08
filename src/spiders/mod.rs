//! Site spiders and the contract the crawl driver uses to run them.

pub mod ndss;
pub mod osdi;
pub mod usenix;

pub use ndss::NdssSpider;
pub use osdi::OsdiSpider;
pub use usenix::UsenixSpider;

use crate::page::FetchedPage;
use crate::record::PaperRecord;
use crate::request::FetchRequest;
use crate::{Error, Result};
use url::Url;

/// What handling one page produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpiderOutput {
    /// Fetch another page
    Follow(FetchRequest),
    /// A finished record
    Record(PaperRecord),
}

/// Construction parameters shared by every spider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpiderArgs {
    pub conference: Option<String>,
    pub year: Option<String>,
}

impl SpiderArgs {
    #[must_use]
    pub fn new(conference: Option<&str>, year: Option<&str>) -> Self {
        Self {
            conference: conference.map(ToString::to_string),
            year: year.map(ToString::to_string),
        }
    }

    /// Supplied conference, or the spider's default
    pub(crate) fn conference_or(&self, default: &str) -> String {
        non_empty_arg(self.conference.as_deref()).unwrap_or(default).to_string()
    }

    /// Supplied year, or the spider's default
    pub(crate) fn year_or(&self, default: &str) -> String {
        non_empty_arg(self.year.as_deref()).unwrap_or(default).to_string()
    }

    /// Supplied year, or a configuration error naming the spider
    pub(crate) fn require_year(&self, spider: &str) -> Result<String> {
        non_empty_arg(self.year.as_deref())
            .map(ToString::to_string)
            .ok_or_else(|| Error::MissingParameter {
                spider: spider.to_string(),
                parameter: "year".to_string(),
            })
    }
}

fn non_empty_arg(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A site-specific crawl recipe.
///
/// `seed` names the first pages to fetch. Every fetched page comes back
/// through `handle` together with the request that produced it, so the
/// spider can dispatch on `request.stage` and read any carried context.
/// Handling is synchronous and never fails: missing markup degrades to
/// empty fields or to an empty output for that branch.
pub trait Spider: Send + Sync {
    /// Unique spider name used on the command line
    fn name(&self) -> &'static str;

    /// Conference this instance crawls
    fn conference(&self) -> &str;

    /// Year this instance crawls
    fn year(&self) -> &str;

    /// Initial requests
    fn seed(&self) -> Vec<FetchRequest>;

    /// Interpret one fetched page
    fn handle(&self, page: &FetchedPage, request: &FetchRequest) -> Vec<SpiderOutput>;
}

/// Names accepted by [`build`]
pub const SPIDER_NAMES: &[&str] = &[NdssSpider::NAME, OsdiSpider::NAME, UsenixSpider::NAME];

/// Construct a spider by name
pub fn build(name: &str, args: &SpiderArgs) -> Result<Box<dyn Spider>> {
    match name {
        NdssSpider::NAME => Ok(Box::new(NdssSpider::new(args)?)),
        OsdiSpider::NAME => Ok(Box::new(OsdiSpider::new(args))),
        UsenixSpider::NAME => Ok(Box::new(UsenixSpider::new(args))),
        other => Err(Error::UnknownSpider(other.to_string())),
    }
}

/// Two-digit year suffix used in USENIX conference slugs ("2024" -> "24")
pub(crate) fn short_year(year: &str) -> &str {
    let year = year.trim();
    if year.len() == 4 && year.is_ascii() {
        &year[2..]
    } else {
        year
    }
}

pub(crate) fn parse_seed(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::error!("Invalid seed URL {}: {}", url, e);
            None
        }
    }
}
