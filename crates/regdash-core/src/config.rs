//! Application configuration management.
//!
//! Configuration is read from `~/.config/regdash/config.json` and then
//! overridden by environment variables (a `.env` file is honored by the
//! binary before this runs):
//!
//! - `REGDASH_API_URL`: table records endpoint
//! - `REGDASH_API_TOKEN`: API token sent with every request
//! - `REGDASH_TOKEN_HEADER`: header carrying the token (default `xc-token`)
//! - `REGDASH_PAGE_SIZE`: rows per request (default 1000)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::api::{FetchOptions, Headers, DEFAULT_FIELDS, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "regdash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Header the table API reads its token from
pub const DEFAULT_TOKEN_HEADER: &str = "xc-token";

/// Affiliations listed on the dashboard before the rest are folded away.
pub const DEFAULT_TOP_AFFILIATIONS: usize = 10;

pub const ENV_API_URL: &str = "REGDASH_API_URL";
pub const ENV_API_TOKEN: &str = "REGDASH_API_TOKEN";
pub const ENV_TOKEN_HEADER: &str = "REGDASH_TOKEN_HEADER";
pub const ENV_PAGE_SIZE: &str = "REGDASH_PAGE_SIZE";

fn default_token_header() -> String {
    DEFAULT_TOKEN_HEADER.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_fields() -> Vec<String> {
    DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_top_affiliations() -> usize {
    DEFAULT_TOP_AFFILIATIONS
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    /// Usually supplied through the environment rather than the file
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_token_header")]
    pub token_header: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_top_affiliations")]
    pub top_affiliations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            api_token: None,
            token_header: default_token_header(),
            page_size: default_page_size(),
            fields: default_fields(),
            request_timeout_secs: default_timeout_secs(),
            top_affiliations: default_top_affiliations(),
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production). Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            self.api_token = Some(token);
        }
        if let Some(header) = get(ENV_TOKEN_HEADER) {
            self.token_header = header;
        }
        if let Some(raw) = get(ENV_PAGE_SIZE) {
            match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => self.page_size = size,
                _ => warn!(value = %raw, "Ignoring invalid {}", ENV_PAGE_SIZE),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for log files
    pub fn log_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn api_url(&self) -> Result<&str> {
        self.api_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No API URL configured (set {})", ENV_API_URL))
    }

    /// Request headers: JSON accept plus the API token
    pub fn headers(&self) -> Result<Headers> {
        let token = self
            .api_token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No API token configured (set {})", ENV_API_TOKEN))?;

        let mut headers = Headers::new();
        headers.insert("accept".to_string(), "application/json".to_string());
        headers.insert(self.token_header.clone(), token.to_string());
        Ok(headers)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            page_size: self.page_size,
            fields: self.fields.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
