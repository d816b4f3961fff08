//! Fetch capability used by the crawl driver.
//!
//! Spiders never perform I/O; the driver hands each [`FetchRequest`] to a
//! [`Fetcher`] and routes the resulting page back to the spider. Tests swap
//! in canned pages through the same trait.

use crate::config::HttpConfig;
use crate::request::FetchRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A response as returned by the fetch layer, before parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// Final URL after any redirects
    pub url: Url,
    pub status: u16,
    pub body: String,
}

impl RawPage {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Something that can turn a request into a page
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawPage>;
}

/// `reqwest`-backed fetcher. No retries and no throttling.
pub struct HttpFetcher {
    client: Client,
    no_redirect_client: Client,
}

impl HttpFetcher {
    /// Build HTTP clients from configuration
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Self::builder(config)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?;
        let no_redirect_client = Self::builder(config)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            no_redirect_client,
        })
    }

    fn builder(config: &HttpConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .gzip(true)
            .user_agent(config.user_agent.as_str())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawPage> {
        let client = if request.flags.dont_redirect {
            &self.no_redirect_client
        } else {
            &self.client
        };

        debug!("GET {} (stage {})", request.url, request.stage);
        let response = client
            .get(request.url.clone())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await?;

        let url = response.url().clone();
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("{} -> {} ({} bytes)", url, status, body.len());

        Ok(RawPage { url, status, body })
    }
}

impl From<&RawPage> for Error {
    fn from(page: &RawPage) -> Self {
        Self::HttpStatus {
            status: page.status,
            url: page.url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_creation() {
        assert!(HttpFetcher::new(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_raw_page_status() {
        let page = |status| RawPage {
            url: Url::parse("https://example.org/").unwrap(),
            status,
            body: String::new(),
        };
        assert!(page(200).is_success());
        assert!(!page(301).is_success());

        let err = Error::from(&page(404));
        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    }
}
