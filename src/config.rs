//! Configuration file support for freshfood
//!
//! Config is loaded from `~/.freshfood/config.toml` (or `$FRESHFOOD_HOME/config.toml`).
//! Environment variables override config file settings.
//!
//! Unlike a process-wide singleton, a `Config` is built once by the caller and
//! handed to the client and stores, so tests can point them anywhere.

use crate::logging;
use crate::storage::freshfood_dir;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://appgw-freshfood.australiaeast.cloudapp.azure.com/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings
    pub api: ApiConfig,

    /// Local persistence settings
    pub storage: StorageConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Upper bound for a single request, in seconds (default: 30)
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("freshfood/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Logical backend endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ShoppingList,
    ImageRecognition,
    LeftoverRecommendation,
    RecipeDetail,
    Staples,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::ShoppingList => "/shopping-list/items/",
            Endpoint::ImageRecognition => "/image-recognition/analyze-image/",
            Endpoint::LeftoverRecommendation => "/leftover-recommendation/recommend/",
            Endpoint::RecipeDetail => "/leftover-recommendation/recipes/",
            Endpoint::Staples => "/user-preferences/staples/",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::ShoppingList => "shopping_list",
            Endpoint::ImageRecognition => "image_recognition",
            Endpoint::LeftoverRecommendation => "leftover_recommendation",
            Endpoint::RecipeDetail => "recipe_detail",
            Endpoint::Staples => "staples",
        }
    }
}

impl ApiConfig {
    /// Config pointing at `base_url` with defaults for everything else.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of an endpoint.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint.path())
    }

    /// URL of a sub-resource below an endpoint, e.g. `items/7/`.
    pub fn resource_url(&self, endpoint: Endpoint, segment: &str) -> String {
        format!("{}{}/", self.endpoint_url(endpoint), segment.trim_matches('/'))
    }
}

/// Local persistence settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for persisted state (default: ~/.freshfood/state)
    pub dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(freshfood_dir()?.join("state")),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> Option<PathBuf> {
        freshfood_dir().ok().map(|d| d.join("config.toml"))
    }

    /// Load config from file, with environment variable overrides
    pub fn load() -> Self {
        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    fn load_from_file() -> Option<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return None;
        }

        let content = std::fs::read_to_string(&path).ok()?;
        match Self::parse(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                logging::error(&format!("Failed to parse config {}: {}", path.display(), e));
                None
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Self>(content)
    }

    /// Apply overrides from a variable lookup (the environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("FRESHFOOD_BASE_URL") {
            if !v.trim().is_empty() {
                self.api.base_url = v.trim().to_string();
            }
        }
        if let Some(v) = lookup("FRESHFOOD_TIMEOUT_SECS") {
            match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.api.timeout_secs = secs,
                _ => logging::warn(&format!("Ignoring invalid FRESHFOOD_TIMEOUT_SECS={}", v)),
            }
        }
        if let Some(v) = lookup("FRESHFOOD_USER_AGENT") {
            self.api.user_agent = v;
        }
        if let Some(v) = lookup("FRESHFOOD_STATE_DIR") {
            self.storage.dir = Some(PathBuf::from(v));
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> anyhow::Result<PathBuf> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("No home directory"))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let default_content = format!(
            r#"# freshfood configuration file
# Environment variables (FRESHFOOD_*) override these values.

[api]
# Backend base URL
base_url = "{}"

# Request timeout in seconds
timeout_secs = {}

[storage]
# Directory for locally persisted ingredients (default: ~/.freshfood/state)
# dir = "/path/to/state"
"#,
            DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS
        );

        std::fs::write(&path, default_content)?;
        Ok(path)
    }
}
