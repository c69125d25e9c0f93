//! Application configuration structures.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable holding the password or API token.
pub const PASSWORD_ENV: &str = "BLOG_MIRROR_PASSWORD";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote server, space and credentials
    #[serde(default)]
    pub server: ServerConfig,

    /// Blog listing bounds
    #[serde(default)]
    pub listing: ListingConfig,

    /// Local output location
    #[serde(default)]
    pub output: OutputConfig,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            return Err(AppError::validation("server.url is empty"));
        }
        url::Url::parse(self.server.base_url())
            .map_err(|e| AppError::validation(format!("server.url is not a URL: {e}")))?;
        if self.server.space.trim().is_empty() {
            return Err(AppError::validation("server.space is empty"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.attachment_page_limit == 0 {
            return Err(AppError::validation(
                "crawler.attachment_page_limit must be > 0",
            ));
        }
        if let Some(end) = self.listing.end {
            if end < self.listing.start {
                return Err(AppError::validation(format!(
                    "listing.end ({end}) is before listing.start ({})",
                    self.listing.start
                )));
            }
        }
        Ok(())
    }

    /// Folder holding everything mirrored from the configured space.
    pub fn mirror_root(&self) -> PathBuf {
        expand_home(&self.output.folder).join(&self.server.space)
    }
}

/// Remote server location and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    /// Server root URL, e.g. `https://confluence.example.com`
    #[serde(default)]
    pub url: String,

    /// Space key whose blog is mirrored
    #[serde(default)]
    pub space: String,

    /// Login for HTTP basic authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password or token; the environment variable takes precedence
    #[serde(default)]
    pub password: Option<String>,

    /// Outbound proxy for every request
    #[serde(default)]
    pub proxy: Option<String>,
}

impl ServerConfig {
    /// Server URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.url.trim().trim_end_matches('/')
    }

    /// Resolve credentials from the config file and the environment.
    pub fn credentials(&self) -> Option<Credentials> {
        let username = self.username.clone()?;
        let password = env::var(PASSWORD_ENV).ok().or_else(|| self.password.clone());
        Some(Credentials { username, password })
    }
}

/// HTTP basic authentication pair.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Blog listing bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Offset of the first listed post (0 is roughly the most recent)
    #[serde(default)]
    pub start: u64,

    /// Stop once this cumulative offset is reached
    #[serde(default)]
    pub end: Option<u64>,

    /// Merge with the existing index instead of replacing it
    #[serde(default = "defaults::merge")]
    pub merge: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            merge: defaults::merge(),
        }
    }
}

/// Local output location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Folder under which `{space}/` is created
    #[serde(default = "defaults::folder")]
    pub folder: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: defaults::folder(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between list pages and between posts in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent posts or downloads
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Page size requested for comment and attachment children
    #[serde(default = "defaults::attachment_page_limit")]
    pub attachment_page_limit: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            attachment_page_limit: defaults::attachment_page_limit(),
        }
    }
}

fn expand_home(folder: &str) -> PathBuf {
    if let Some(rest) = folder.strip_prefix("~") {
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home).join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(folder)
}

mod defaults {
    pub fn merge() -> bool {
        true
    }
    pub fn folder() -> String {
        ".".into()
    }
    pub fn user_agent() -> String {
        concat!("blog-mirror/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        0
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn attachment_page_limit() -> u32 {
        999
    }
}
