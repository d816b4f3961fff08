pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod page;
pub mod pipeline;
pub mod record;
pub mod request;
pub mod spiders;

pub use client::{Fetcher, HttpFetcher, RawPage};
pub use config::{Config, ConfigOverrides, LogFormat};
pub use engine::{CrawlStats, Crawler};
pub use error::{Error, Result};
pub use page::FetchedPage;
pub use pipeline::{JsonLinesSink, RecordSink};
pub use record::{PaperContext, PaperRecord, SourceTag};
pub use request::{FetchRequest, RequestFlags, Stage};
pub use spiders::{Spider, SpiderArgs, SpiderOutput};
