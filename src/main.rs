use anyhow::Context;
use clap::{Parser, Subcommand};
use confscrape::config::LoggingConfig;
use confscrape::spiders::{self, SPIDER_NAMES};
use confscrape::{
    Config, ConfigOverrides, Crawler, HttpFetcher, JsonLinesSink, LogFormat, SpiderArgs,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "confscrape", version, about = "Crawl conference websites for accepted papers")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `confscrape=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a spider and write records as JSON lines
    Crawl {
        /// Spider name (see `list`)
        spider: String,

        /// Conference slug, when the spider supports more than one
        #[arg(long)]
        conference: Option<String>,

        /// Conference year, e.g. 2024
        #[arg(short, long)]
        year: Option<String>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after this many requests
        #[arg(long)]
        max_requests: Option<usize>,

        /// HTTP timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// User agent sent with every request
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// List available spiders
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut overrides = ConfigOverrides {
        log_level: cli.log_level.clone(),
        log_format: cli.log_format,
        ..ConfigOverrides::default()
    };

    match cli.command {
        Command::List => {
            for name in SPIDER_NAMES {
                println!("{name}");
            }
            Ok(())
        }
        Command::Crawl {
            spider,
            conference,
            year,
            output,
            max_requests,
            timeout,
            user_agent,
        } => {
            overrides.output = output;
            overrides.max_requests = max_requests;
            overrides.timeout_secs = timeout;
            overrides.user_agent = user_agent;

            let mut config =
                Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
            config.apply_overrides(&overrides);
            config.validate().context("Invalid configuration")?;
            init_tracing(&config.logging);

            let args = SpiderArgs::new(conference.as_deref(), year.as_deref());
            let spider = spiders::build(&spider, &args)?;
            let fetcher = HttpFetcher::new(&config.http).context("Failed to build HTTP client")?;
            let crawler = Crawler::new(fetcher, config.crawl.clone());

            let writer: Box<dyn Write> = match &config.output.path {
                Some(path) => Box::new(
                    File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?,
                ),
                None => Box::new(io::stdout().lock()),
            };
            let mut sink = JsonLinesSink::new(BufWriter::new(writer));

            let stats = crawler.run(spider.as_ref(), &mut sink).await?;
            info!("Wrote {} records", stats.records);
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
