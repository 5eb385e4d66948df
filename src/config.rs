use anyhow::{Context, Result};
use clap::Args;
use reqwest::Url;
use std::path::PathBuf;

/// Connection settings shared by every subcommand
#[derive(Args, Debug)]
pub struct CliArgs {
    /// Base URL of the Altura REST backend
    #[arg(short = 'u', long, env = "ALTURA_API_URL", default_value = "http://localhost:4000")]
    pub api_url: String,

    /// Path to the credential store (defaults to ~/.altura/credentials.sqlite3)
    #[arg(short = 'c', long, env = "ALTURA_CREDENTIALS_FILE")]
    pub credentials_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    /// Token refresh timeout in seconds
    #[arg(long, env = "REFRESH_TIMEOUT", default_value = "10")]
    pub refresh_timeout: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: Url,
    pub credentials_file: PathBuf,
    pub log_level: String,

    // HTTP client
    pub http_max_connections: usize,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,
    pub refresh_timeout: u64,
}

impl Config {
    /// Build configuration from parsed CLI arguments, with ENV fallbacks for
    /// the knobs that rarely change.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let api_url = Url::parse(&args.api_url)
            .with_context(|| format!("Invalid ALTURA_API_URL: {}", args.api_url))?;

        let credentials_file = args
            .credentials_file
            .as_deref()
            .map(expand_tilde)
            .or_else(default_credentials_file)
            .context("Cannot determine credentials file location (set ALTURA_CREDENTIALS_FILE)")?;

        Ok(Config {
            api_url,
            credentials_file,
            log_level: args.log_level.clone(),

            http_max_connections: std::env::var("HTTP_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),

            http_connect_timeout: std::env::var("HTTP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),

            http_request_timeout: args.http_timeout,
            refresh_timeout: args.refresh_timeout,
        })
    }

    /// Make sure the credential store location is usable.
    pub fn validate(&self) -> Result<()> {
        if let Some(parent) = self.credentials_file.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!(
                    "Cannot create credential store directory: {}",
                    parent.display()
                )
            })?;
        }
        Ok(())
    }
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

fn default_credentials_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".altura/credentials.sqlite3"))
}
