use crate::record::PaperContext;
use std::fmt;
use url::Url;

/// Handler stage a fetched page is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    // ndss
    Landing,
    YearPage,
    PaperList,
    PaperDetail,
    // osdi
    SessionPage,
    PaperPage,
    // usenix
    ListingPage,
    PresentationPage,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Landing => "landing",
            Self::YearPage => "year_page",
            Self::PaperList => "paper_list",
            Self::PaperDetail => "paper_detail",
            Self::SessionPage => "session_page",
            Self::PaperPage => "paper_page",
            Self::ListingPage => "listing_page",
            Self::PresentationPage => "presentation_page",
        };
        f.write_str(name)
    }
}

/// Hints for the fetch layer. Nothing here is enforced by the spiders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFlags {
    /// Do not follow HTTP redirects
    pub dont_redirect: bool,
    /// Fetch even if the URL was already requested
    pub dont_filter: bool,
}

/// A page the crawler should fetch next, and who handles it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    pub stage: Stage,
    pub context: Option<PaperContext>,
    pub flags: RequestFlags,
}

impl FetchRequest {
    #[must_use]
    pub fn new(url: Url, stage: Stage) -> Self {
        Self {
            url,
            stage,
            context: None,
            flags: RequestFlags::default(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: PaperContext) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub const fn dont_filter(mut self) -> Self {
        self.flags.dont_filter = true;
        self
    }

    #[must_use]
    pub const fn dont_redirect(mut self) -> Self {
        self.flags.dont_redirect = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_flags() {
        let url = Url::parse("https://www.usenix.org/conference/usenixsecurity24/").unwrap();
        let request = FetchRequest::new(url, Stage::ListingPage)
            .dont_filter()
            .dont_redirect();

        assert!(request.flags.dont_filter);
        assert!(request.flags.dont_redirect);
        assert!(request.context.is_none());
        assert_eq!(request.stage.to_string(), "listing_page");
    }
}
