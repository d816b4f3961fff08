use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag identifying which venue produced a record.
///
/// Downstream storage keys some venues by a numeric id and others by the
/// page the metadata came from, so both shapes serialize untagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceTag {
    Id(u32),
    Url(String),
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Metadata gathered for one paper before its PDF link is known.
///
/// Listing pages build this and attach it to the follow-up request so the
/// detail-page handler can finish the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperContext {
    pub title: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub abstract_url: String,
}

impl PaperContext {
    /// Finalize into a record. `file_urls` is derived from `pdf_url` here
    /// and nowhere else.
    #[must_use]
    pub fn into_record(self, pdf_url: Option<String>, source_url: SourceTag) -> PaperRecord {
        let pdf_url = pdf_url.filter(|url| !url.is_empty()).unwrap_or_default();
        let file_urls = if pdf_url.is_empty() {
            Vec::new()
        } else {
            vec![pdf_url.clone()]
        };

        PaperRecord {
            title: self.title,
            authors: self.authors,
            abstract_text: self.abstract_text,
            abstract_url: self.abstract_url,
            pdf_url,
            file_urls,
            source_url,
        }
    }
}

/// One conference paper, as handed to the download/storage pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub abstract_url: String,
    /// Absolute PDF URL, empty when none was found
    pub pdf_url: String,
    /// `[pdf_url]` when a PDF was found, empty otherwise
    pub file_urls: Vec<String>,
    pub source_url: SourceTag,
}

impl PaperRecord {
    #[must_use]
    pub fn has_pdf(&self) -> bool {
        !self.pdf_url.is_empty()
    }
}
