//! Client configuration
//!
//! Read from a TOML file; every key is optional.
//!
//! ```toml
//! data_path = "drafts.json"
//! log_filter = "mochi_sync=debug,info"
//! remote = true
//!
//! [sync]
//! request_timeout_ms = 5000
//!
//! [authority]
//! base_url = "https://mochilist.example"
//! timeout_ms = 8000
//! ```

use anyhow::Context;
use mochi_authority::AuthorityConfig;
use mochi_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "mochilist.toml";

/// Environment variable that overrides `log_filter`
pub const LOG_ENV: &str = "MOCHILIST_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Draft file holding every local plan
    pub data_path: PathBuf,
    /// `tracing` filter directives
    pub log_filter: String,
    /// Confirm changes with the authority instead of keeping them local
    pub remote: bool,
    pub sync: SyncConfig,
    pub authority: AuthorityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("mochilist-drafts.json"),
            log_filter: "info".to_string(),
            remote: false,
            sync: SyncConfig::default(),
            authority: AuthorityConfig::default(),
        }
    }
}

impl ClientConfig {
    #[inline]
    #[must_use]
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_remote(mut self, authority: AuthorityConfig) -> Self {
        self.remote = true;
        self.authority = authority;
        self
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// Malformed TOML or mistyped keys
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid client configuration")
    }

    /// Load `explicit`, else [`DEFAULT_CONFIG_FILE`] if present, else defaults
    ///
    /// # Errors
    /// An explicit file that cannot be read, or any file that does not parse
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }
}
