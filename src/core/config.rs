use crate::core::ClaudeError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// API version sent in the `anthropic-version` header
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
/// Base URL of the public Claude API
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
const API_VERSION_VAR: &str = "ANTHROPIC_VERSION";
const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";

/// Connection settings used when building requests.
///
/// `Config` is a plain value. The `with_*` methods return a copy with one field
/// replaced. An empty `api_key` is accepted here and rejected when a request is built.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub api_version: String,
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Reads settings from the environment, loading a `.env` file first if one exists.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        Self::from_vars(|name| dotenv::var(name).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(api_key) = lookup(API_KEY_VAR) {
            config.api_key = api_key;
        }
        if let Some(api_version) = lookup(API_VERSION_VAR) {
            config.api_version = api_version;
        }
        if let Some(base_url) = lookup(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        config
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ClaudeError> {
        toml::from_str(contents)
            .map_err(|e| ClaudeError::Config(format!("Failed to parse config file: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClaudeError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ClaudeError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&contents)
    }
}
