//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `CONFSCRAPE__*` environment variables, then command-line overrides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable prefix for configuration values
pub const ENV_PREFIX: &str = "CONFSCRAPE";

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub crawl: CrawlConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

/// HTTP client settings used by the fetch layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent string sent with every request
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Maximum redirects to follow when redirects are allowed
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!(
                "confscrape/{} (Academic Research Tool)",
                env!("CARGO_PKG_VERSION")
            ),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_redirects: 10,
        }
    }
}

/// Crawl driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Stop after this many requests (0 = unlimited)
    pub max_requests: usize,
    /// Skip URLs that were already requested unless a request opts out
    pub dedupe: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_requests: 0,
            dedupe: true,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `confscrape=debug`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON-lines output file; stdout when unset
    pub path: Option<PathBuf>,
}

/// Values supplied on the command line, applied after every other layer
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_requests: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub output: Option<PathBuf>,
}

impl Config {
    /// Load configuration from defaults, an optional file, and the environment.
    /// Not validated here: call [`Config::validate`] once overrides are applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(user_agent) = &overrides.user_agent {
            self.http.user_agent.clone_from(user_agent);
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.http.timeout_secs = timeout;
        }
        if let Some(max_requests) = overrides.max_requests {
            self.crawl.max_requests = max_requests;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level.clone_from(level);
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
        if let Some(output) = &overrides.output {
            self.output.path = Some(output.clone());
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(Error::InvalidInput {
                field: "http.user_agent".to_string(),
                reason: "user agent cannot be empty".to_string(),
            });
        }

        if self.http.timeout_secs == 0 {
            return Err(Error::InvalidInput {
                field: "http.timeout_secs".to_string(),
                reason: "timeout must be greater than 0".to_string(),
            });
        }

        if self.http.connect_timeout_secs == 0 {
            return Err(Error::InvalidInput {
                field: "http.connect_timeout_secs".to_string(),
                reason: "connect timeout must be greater than 0".to_string(),
            });
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(Error::InvalidInput {
                field: "logging.level".to_string(),
                reason: format!("invalid filter directive: {e}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // `load` reads process-wide environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.crawl.dedupe);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.output.path.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.http.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));
        config.http.timeout_secs = 30;

        config.http.user_agent = "  ".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));
        config.http.user_agent = "test-agent".to_string();

        config.logging.level = "confscrape=notalevel".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[http]
timeout_secs = 5

[crawl]
max_requests = 40

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.crawl.max_requests, 40);
        assert_eq!(config.logging.format, LogFormat::Json);
        // untouched sections keep their defaults
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert!(config.crawl.dedupe);
    }

    #[test]
    fn test_environment_layer() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        std::env::set_var("CONFSCRAPE__CRAWL__MAX_REQUESTS", "7");
        std::env::set_var("CONFSCRAPE__CRAWL__DEDUPE", "false");
        let result = Config::load(None);
        std::env::remove_var("CONFSCRAPE__CRAWL__MAX_REQUESTS");
        std::env::remove_var("CONFSCRAPE__CRAWL__DEDUPE");

        let config = result.unwrap();
        assert_eq!(config.crawl.max_requests, 7);
        assert!(!config.crawl.dedupe);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_overrides_rescue_invalid_file_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[http]\ntimeout_secs = 0").unwrap();

        let mut config = Config::load(Some(file.path())).unwrap();
        assert!(config.validate().is_err());

        config.apply_overrides(&ConfigOverrides {
            timeout_secs: Some(5),
            ..ConfigOverrides::default()
        });
        assert!(config.validate().is_ok());
        assert_eq!(config.http.timeout_secs, 5);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Config::load(Some(Path::new("/nonexistent/confscrape.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        config.apply_overrides(&ConfigOverrides {
            user_agent: Some("papers-bot/1.0".to_string()),
            timeout_secs: Some(3),
            log_level: Some("debug".to_string()),
            output: Some(PathBuf::from("papers.jsonl")),
            ..ConfigOverrides::default()
        });

        assert_eq!(config.http.timeout_secs, 3);
        assert_eq!(config.http.user_agent, "papers-bot/1.0");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.output.path, Some(PathBuf::from("papers.jsonl")));
        assert_eq!(config.crawl.max_requests, 0);
    }
}
