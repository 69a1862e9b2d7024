//! Run configuration (bulletin-sync.toml)
//!
//! All knobs the pipeline needs are carried in one explicit value handed to
//! each component at construction. Built-in defaults can be overridden by an
//! optional TOML file; the store access token always comes from the
//! environment and is never read from a file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Environment variable holding the store access token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing {TOKEN_ENV} environment variable")]
    MissingToken,
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Owner of the asset repository
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Asset repository name (serves the GitHub Pages site)
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Branch the assets are committed to
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Public URL prefix for derived assets.
    /// Defaults to `https://<owner>.github.io/<repo>` when absent.
    pub pages_base: Option<String>,

    /// Repo-relative path of the persisted manifest
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,

    /// Images wider than this are resized down to it (0 = no resize)
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// JPEG encode quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Path prefixes exempt from retention deletion
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,

    /// Timeout for source image fetches, seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Timeout for store writes and deletes, seconds
    #[serde(default = "default_store_timeout")]
    pub store_timeout_secs: u64,
}

fn default_owner() -> String {
    "LogunLACC".to_string()
}

fn default_repo() -> String {
    "lacc-bulletin-assets".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_manifest_path() -> String {
    "manifest.json".to_string()
}

fn default_max_width() -> u32 {
    1200
}

fn default_jpeg_quality() -> u8 {
    88
}

fn default_protected_prefixes() -> Vec<String> {
    vec!["img/static/".to_string()]
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_store_timeout() -> u64 {
    60
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            branch: default_branch(),
            pages_base: None,
            manifest_path: default_manifest_path(),
            max_width: default_max_width(),
            jpeg_quality: default_jpeg_quality(),
            protected_prefixes: default_protected_prefixes(),
            fetch_timeout_secs: default_fetch_timeout(),
            store_timeout_secs: default_store_timeout(),
        }
    }
}

impl SyncConfig {
    /// Load and parse config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse config from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_empty() || self.repo.is_empty() || self.branch.is_empty() {
            return Err(ConfigError::ValidationError(
                "owner, repo and branch must be non-empty".to_string(),
            ));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::ValidationError(
                "jpeg_quality must be in (0, 100]".to_string(),
            ));
        }
        if self.fetch_timeout_secs == 0 || self.store_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Public URL prefix for derived assets
    pub fn pages_base(&self) -> String {
        match &self.pages_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}.github.io/{}", self.owner, self.repo),
        }
    }

    /// Read the store access token from the environment.
    ///
    /// Absence is a fatal configuration error; the caller must check this
    /// before any network call is attempted.
    pub fn token_from_env() -> Result<String, ConfigError> {
        Self::token_from(std::env::var(TOKEN_ENV).ok())
    }

    fn token_from(value: Option<String>) -> Result<String, ConfigError> {
        match value {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ConfigError::MissingToken),
        }
    }
}
