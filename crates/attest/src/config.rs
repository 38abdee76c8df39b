//! Configuration loading for the retrieval and proof pipelines
//!
//! Settings are loaded from (in order of priority):
//! 1. Runtime environment variables (override individual fields)
//! 2. JSON file (~/.config/attest/attest.json, or an explicit path)
//! 3. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gmail::GmailClient;
use crate::mailbox::{MAX_ENRICHED_PER_PAGE, QueryFilter};

/// Settings filename in the attest config directory
const CONFIG_FILE: &str = "attest.json";

const ENV_SENDER_DOMAIN: &str = "ATTEST_SENDER_DOMAIN";
const ENV_BLUEPRINT_ID: &str = "ATTEST_BLUEPRINT_ID";
const ENV_API_BASE_URL: &str = "ATTEST_API_BASE_URL";

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestConfig {
    /// Sender domain the event platform mails from
    pub sender_domain: String,
    /// Mailbox API root
    pub api_base_url: String,
    /// Messages enriched per search page; the rest of the page is dropped
    pub max_enriched_per_page: usize,
    /// Detail requests in flight at once while enriching a page
    pub detail_concurrency: usize,
    /// Overall timeout per HTTP request
    pub request_timeout_secs: u64,
    /// Proving service blueprint used for attendance proofs
    pub blueprint_id: Option<String>,
}

impl Default for AttestConfig {
    fn default() -> Self {
        Self {
            sender_domain: QueryFilter::DEFAULT_SENDER_DOMAIN.to_string(),
            api_base_url: GmailClient::BASE_URL.to_string(),
            max_enriched_per_page: MAX_ENRICHED_PER_PAGE,
            detail_concurrency: MAX_ENRICHED_PER_PAGE,
            request_timeout_secs: 30,
            blueprint_id: None,
        }
    }
}

impl AttestConfig {
    /// Load settings using the following priority:
    /// 1. Environment variables
    /// 2. JSON file (~/.config/attest/attest.json)
    /// 3. Defaults
    pub fn load() -> Result<Self> {
        let config = if config::config_exists(CONFIG_FILE) {
            config::load_json(CONFIG_FILE)?
        } else {
            Self::default()
        };

        config
            .with_overrides(|key| std::env::var(key).ok())
            .validate()
    }

    /// Load settings from a specific JSON file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = config::load_json_file(path)?;
        config
            .with_overrides(|key| std::env::var(key).ok())
            .validate()
    }

    /// Parse settings from a JSON string; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse config JSON")?;
        config.validate()
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(domain) = non_empty(ENV_SENDER_DOMAIN) {
            self.sender_domain = domain;
        }
        if let Some(blueprint) = non_empty(ENV_BLUEPRINT_ID) {
            self.blueprint_id = Some(blueprint);
        }
        if let Some(base_url) = non_empty(ENV_API_BASE_URL) {
            self.api_base_url = base_url;
        }
        self
    }

    /// Check the settings are usable
    pub fn validate(self) -> Result<Self> {
        url::Url::parse(&self.api_base_url)
            .with_context(|| format!("Invalid api_base_url: {}", self.api_base_url))?;
        anyhow::ensure!(
            !self.sender_domain.trim().is_empty(),
            "sender_domain must not be empty"
        );
        anyhow::ensure!(
            self.max_enriched_per_page > 0,
            "max_enriched_per_page must be at least 1"
        );
        anyhow::ensure!(
            self.detail_concurrency > 0,
            "detail_concurrency must be at least 1"
        );
        Ok(self)
    }

    /// Write these settings to the default settings file
    pub fn save(&self) -> Result<PathBuf> {
        config::save_json(CONFIG_FILE, self)?;
        Self::default_config_path().context("Could not determine config directory")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Search filter for an event name under these settings
    pub fn filter_for(&self, term: &str) -> QueryFilter {
        QueryFilter::for_event(&self.sender_domain, term)
    }

    /// Get the default settings file path (~/.config/attest/attest.json)
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_path(CONFIG_FILE)
    }
}
