//! Minimal crawl driver.
//!
//! Runs one spider to completion: seeds a FIFO queue, fetches each request
//! through a [`Fetcher`], routes the page back to the spider, enqueues
//! follow-ups and passes records to a [`RecordSink`]. A failed fetch drops
//! only its own branch.

use crate::client::{Fetcher, RawPage};
use crate::config::CrawlConfig;
use crate::page::FetchedPage;
use crate::pipeline::RecordSink;
use crate::request::FetchRequest;
use crate::spiders::{Spider, SpiderOutput};
use crate::{Error, Result};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Counters for one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Requests handed to the fetcher
    pub requests: usize,
    /// Pages handed to the spider
    pub pages: usize,
    /// Records emitted
    pub records: usize,
    /// Fetches that failed or returned a non-2xx status
    pub failures: usize,
    /// Requests skipped as duplicates
    pub duplicates: usize,
}

pub struct Crawler<F: Fetcher> {
    fetcher: F,
    config: CrawlConfig,
}

impl<F: Fetcher> Crawler<F> {
    pub const fn new(fetcher: F, config: CrawlConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn into_fetcher(self) -> F {
        self.fetcher
    }

    /// Crawl until the queue drains or the request budget is spent
    pub async fn run(&self, spider: &dyn Spider, sink: &mut dyn RecordSink) -> Result<CrawlStats> {
        info!(
            "Starting {} spider (conference={}, year={})",
            spider.name(),
            spider.conference(),
            spider.year()
        );

        let mut stats = CrawlStats::default();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<FetchRequest> = VecDeque::new();
        for request in spider.seed() {
            self.enqueue(request, &mut queue, &mut seen, &mut stats);
        }

        while let Some(request) = queue.pop_front() {
            if self.config.max_requests > 0 && stats.requests >= self.config.max_requests {
                warn!(
                    "Request budget of {} reached, dropping {} queued requests",
                    self.config.max_requests,
                    queue.len() + 1
                );
                break;
            }
            stats.requests += 1;

            let raw = match self.fetcher.fetch(&request).await {
                Ok(raw) if raw.is_success() => raw,
                Ok(raw) => {
                    warn!("Skipping {}: {}", request.url, Error::from(&raw));
                    stats.failures += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Fetch failed for {}: {}", request.url, e);
                    stats.failures += 1;
                    continue;
                }
            };

            stats.pages += 1;
            for output in Self::process(spider, raw, &request) {
                match output {
                    SpiderOutput::Follow(next) => {
                        self.enqueue(next, &mut queue, &mut seen, &mut stats);
                    }
                    SpiderOutput::Record(record) => {
                        sink.emit(&record)?;
                        stats.records += 1;
                    }
                }
            }
        }

        sink.flush()?;
        info!(
            "{} spider finished: {} requests, {} pages, {} records, {} failures",
            spider.name(),
            stats.requests,
            stats.pages,
            stats.records,
            stats.failures
        );
        Ok(stats)
    }

    /// Parse and hand one page to the spider. Kept synchronous so the parsed
    /// document never lives across an await point.
    fn process(spider: &dyn Spider, raw: RawPage, request: &FetchRequest) -> Vec<SpiderOutput> {
        let page = FetchedPage::parse(raw.url, raw.status, &raw.body);
        spider.handle(&page, request)
    }

    fn enqueue(
        &self,
        request: FetchRequest,
        queue: &mut VecDeque<FetchRequest>,
        seen: &mut HashSet<String>,
        stats: &mut CrawlStats,
    ) {
        let first_visit = seen.insert(request.url.to_string());
        if self.config.dedupe && !request.flags.dont_filter && !first_visit {
            debug!("Filtered duplicate request {}", request.url);
            stats.duplicates += 1;
            return;
        }
        queue.push_back(request);
    }
}
