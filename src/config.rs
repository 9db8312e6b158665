//! Configuration management for the mini miner
//!
//! Supports configuration via command line arguments, environment variables
//! and a configuration file (YAML/JSON). Command line and environment values
//! take precedence over the file, which in turn overrides built-in defaults.

use crate::client::ClientConfig;
use crate::miner::{SearchPolicy, DEFAULT_PROGRESS_INTERVAL};
use crate::{Error, Result};
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default challenge server
pub const DEFAULT_BASE_URL: &str = "https://hackattic.com";

/// Default challenge name
pub const DEFAULT_CHALLENGE: &str = "mini_miner";

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    Plain,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Format name understood by [`crate::utils::init_logging`]
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Plain => "plain",
            LogFormat::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete configuration for the mini miner
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(
    name = "mini-miner",
    version = env!("CARGO_PKG_VERSION"),
    about = "Solve the hackattic mini_miner proof-of-work challenge",
    long_about = "Fetches a block and a difficulty, searches for a nonce whose SHA-256 digest \
                  has enough leading zero bits, and submits it."
)]
pub struct Config {
    /// Print program info and exit
    #[arg(long)]
    #[serde(skip)]
    pub info: bool,

    /// Print the parsed configuration and exit
    #[arg(long)]
    #[serde(skip)]
    pub print_config: bool,

    /// Solve the problem but do not submit the solution
    #[arg(long)]
    #[serde(default)]
    pub dry_run: bool,

    /// Configuration file path (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Challenge access token
    #[arg(long, env = "HACKATTIC_TOKEN", hide_env_values = true)]
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Challenge server base URL
    #[arg(long, env = "MINI_MINER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Challenge name, used to build the problem and solve endpoints
    #[arg(long, default_value = DEFAULT_CHALLENGE)]
    #[serde(default = "default_challenge")]
    pub challenge: String,

    /// HTTP timeout in milliseconds, applied to connect and response
    #[arg(long, default_value = "10000")]
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    /// Give up after this many hash attempts (default: unbounded)
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u64>,

    /// Give up after this much search time, e.g. "30s" or "5m" (default: unbounded)
    #[arg(long, value_name = "DURATION")]
    pub deadline: Option<String>,

    /// Log search progress every N attempts (0 disables)
    #[arg(long, value_name = "N", default_value = "1000000")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Log level
    #[arg(short = 'l', long, default_value = "info")]
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, default_value = "plain")]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process arguments and environment
    ///
    /// Exits the process on `--help`, `--version` or invalid arguments, like
    /// `Parser::parse`.
    pub async fn load() -> Result<Self> {
        let matches = Self::command().get_matches();
        Self::from_matches(&matches).await
    }

    /// Load configuration from an explicit argument list
    pub async fn load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command()
            .try_get_matches_from(args)
            .map_err(|e| Error::config(e.to_string()))?;
        Self::from_matches(&matches).await
    }

    async fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut config =
            Self::from_arg_matches(matches).map_err(|e| Error::config(e.to_string()))?;

        if let Some(config_file) = config.config_file.clone() {
            let file_config = Self::load_from_file(&config_file).await?;
            config = config.merge_with_file(file_config, matches);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(Error::from)
        } else {
            // Default to YAML
            serde_yaml::from_str(&content).map_err(Error::from)
        }
    }

    /// Merge CLI config with file config (explicit CLI and env values win)
    fn merge_with_file(mut self, file: Self, matches: &ArgMatches) -> Self {
        let explicit = |id: &str| {
            matches!(
                matches.value_source(id),
                Some(ValueSource::CommandLine) | Some(ValueSource::EnvVariable)
            )
        };

        if self.token.is_none() {
            self.token = file.token;
        }
        if self.max_attempts.is_none() {
            self.max_attempts = file.max_attempts;
        }
        if self.deadline.is_none() {
            self.deadline = file.deadline;
        }
        if !explicit("dry_run") {
            self.dry_run = file.dry_run;
        }
        if !explicit("base_url") {
            self.base_url = file.base_url;
        }
        if !explicit("challenge") {
            self.challenge = file.challenge;
        }
        if !explicit("http_timeout") {
            self.http_timeout = file.http_timeout;
        }
        if !explicit("progress_interval") {
            self.progress_interval = file.progress_interval;
        }
        if !explicit("log_level") {
            self.log_level = file.log_level;
        }
        if !explicit("log_format") {
            self.log_format = file.log_format;
        }

        self
    }

    /// Validate configuration
    ///
    /// The token is checked separately by [`Config::token`] so that
    /// `--info` and `--print-config` work without one.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.challenge.is_empty() || self.challenge.contains('/') {
            return Err(Error::config(format!(
                "Invalid challenge name: {:?}",
                self.challenge
            )));
        }

        if self.http_timeout == 0 {
            return Err(Error::config("HTTP timeout must be greater than 0"));
        }

        self.deadline_duration()?;

        Ok(())
    }

    /// The access token, or a configuration error telling the user how to set it
    pub fn token(&self) -> Result<&str> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(Error::config(
                "HACKATTIC_TOKEN is not set. Run \"export HACKATTIC_TOKEN=your_token_here\"",
            )),
        }
    }

    /// Parsed base URL, always ending in `/` so endpoints join below it
    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("Invalid base URL: {}", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Unsupported base URL scheme: {}",
                url.scheme()
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }

    /// Get HTTP timeout duration
    pub fn http_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.http_timeout)
    }

    /// Get parsed search deadline
    pub fn deadline_duration(&self) -> Result<Option<Duration>> {
        self.deadline
            .as_deref()
            .map(|s| {
                humantime::parse_duration(s)
                    .map_err(|e| Error::config(format!("Invalid deadline {:?}: {}", s, e)))
            })
            .transpose()
    }

    /// Stopping policy for the nonce search
    pub fn search_policy(&self) -> Result<SearchPolicy> {
        Ok(SearchPolicy {
            max_attempts: self.max_attempts,
            deadline: self.deadline_duration()?,
        })
    }

    /// Settings for the challenge client; fails when the token is missing
    pub fn client_config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig {
            base_url: self.base_url()?,
            challenge: self.challenge.clone(),
            token: self.token()?.to_string(),
            timeout: self.http_timeout_duration(),
        })
    }
}

// Default value functions for serde
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_challenge() -> String { DEFAULT_CHALLENGE.to_string() }
fn default_http_timeout() -> u64 { 10_000 }
fn default_progress_interval() -> u64 { DEFAULT_PROGRESS_INTERVAL }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_format() -> LogFormat { LogFormat::Plain }

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_config_defaults() {
        let config = Config::try_parse_from(["mini-miner"]).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.challenge, DEFAULT_CHALLENGE);
        assert_eq!(config.http_timeout_duration(), Duration::from_secs(10));
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.log_format, LogFormat::Plain);
        assert!(!config.dry_run);
        assert!(config.search_policy().unwrap().is_unbounded());
    }

    #[test]
    fn test_missing_token() {
        let mut config = Config::try_parse_from(["mini-miner"]).unwrap();
        config.token = None;
        assert_matches!(config.token(), Err(Error::Config { .. }));
        assert_matches!(config.client_config(), Err(Error::Config { .. }));

        config.token = Some("   ".to_string());
        assert_matches!(config.token(), Err(Error::Config { .. }));
    }

    #[test]
    fn test_client_config() {
        let config = Config::try_parse_from([
            "mini-miner",
            "--token",
            "secret",
            "--base-url",
            "http://localhost:8080/api",
            "--http-timeout",
            "2500",
        ])
        .unwrap();

        let client = config.client_config().unwrap();
        assert_eq!(client.token, "secret");
        assert_eq!(client.base_url.as_str(), "http://localhost:8080/api/");
        assert_eq!(client.challenge, "mini_miner");
        assert_eq!(client.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_search_policy_from_flags() {
        let config = Config::try_parse_from([
            "mini-miner",
            "--max-attempts",
            "5000",
            "--deadline",
            "1m 30s",
        ])
        .unwrap();

        let policy = config.search_policy().unwrap();
        assert_eq!(policy.max_attempts, Some(5000));
        assert_eq!(policy.deadline, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_validation() {
        let config = Config::try_parse_from(["mini-miner", "--deadline", "soon"]).unwrap();
        assert_matches!(config.validate(), Err(Error::Config { .. }));

        let config = Config::try_parse_from(["mini-miner", "--base-url", "ftp://example.com"]).unwrap();
        assert_matches!(config.validate(), Err(Error::Config { .. }));

        let config = Config::try_parse_from(["mini-miner", "--http-timeout", "0"]).unwrap();
        assert_matches!(config.validate(), Err(Error::Config { .. }));

        let config = Config::try_parse_from(["mini-miner", "--challenge", "a/b"]).unwrap();
        assert_matches!(config.validate(), Err(Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_config_from_yaml() {
        let yaml_content = r#"
token: "from-file"
base_url: "http://example.com:8080"
http_timeout: 2000
max_attempts: 100
log_format: json
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.token.as_deref(), Some("from-file"));
        assert_eq!(config.base_url, "http://example.com:8080");
        assert_eq!(config.http_timeout, 2000);
        assert_eq!(config.max_attempts, Some(100));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.challenge, DEFAULT_CHALLENGE);
    }

    #[tokio::test]
    async fn test_config_from_json() {
        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(temp_file, r#"{{"challenge": "mini_miner", "deadline": "10s"}}"#).unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.deadline.as_deref(), Some("10s"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn test_cli_overrides_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            "token: from-file\nhttp_timeout: 2000\nprogress_interval: 10\n"
        )
        .unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let config = Config::load_from([
            "mini-miner",
            "--config-file",
            path.as_str(),
            "--token",
            "from-cli",
            "--http-timeout",
            "500",
        ])
        .await
        .unwrap();

        assert_eq!(config.token.as_deref(), Some("from-cli"));
        assert_eq!(config.http_timeout, 500);
        assert_eq!(config.progress_interval, 10);
    }

    #[tokio::test]
    async fn test_unparseable_config_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "http_timeout: [not a number").unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let err = Config::load_from(["mini-miner", "--config-file", path.as_str()])
            .await
            .unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_token_never_serialized() {
        let config = Config::try_parse_from(["mini-miner", "--token", "super-secret"]).unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("super-secret"));
        assert!(yaml.contains("base_url"));
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
