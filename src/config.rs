//! Configuration Management
//!
//! Persistent user configuration plus the immutable [`ClientConfig`] every
//! service is built from.

use crate::arm::auth::{get_default_resource_group, get_default_subscription};
use crate::arm::error::{ArmError, ArmResult};
use crate::arm::url::DEFAULT_ENDPOINT;
use crate::resource::snapshot::DEFAULT_COMPUTE_API_VERSION;
use crate::resource::storage::DEFAULT_STORAGE_API_VERSION;
use crate::resource::validate::require_group;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings fixed for the lifetime of a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub subscription_id: String,
    /// Used only when a caller doesn't name a group
    pub default_resource_group: Option<String>,
    pub endpoint: String,
    pub storage_api_version: String,
    pub compute_api_version: String,
    /// Per-group limit for multi-group listings
    pub aggregate_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(subscription_id: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            default_resource_group: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            storage_api_version: DEFAULT_STORAGE_API_VERSION.to_string(),
            compute_api_version: DEFAULT_COMPUTE_API_VERSION.to_string(),
            aggregate_timeout: None,
        }
    }

    /// Point at a different management endpoint (sovereign clouds, tests)
    pub fn with_endpoint(mut self, endpoint: &str) -> ArmResult<Self> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| ArmError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ArmError::Config(format!(
                "endpoint '{}' must use http or https",
                endpoint
            )));
        }
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_default_group(mut self, group: Option<String>) -> Self {
        self.default_resource_group = group.filter(|g| !g.trim().is_empty());
        self
    }

    /// The group an operation should use: the explicit one, else the default.
    pub fn resolve_group(&self, explicit: Option<&str>) -> ArmResult<String> {
        let group = explicit
            .filter(|g| !g.trim().is_empty())
            .or(self.default_resource_group.as_deref())
            .unwrap_or_default();
        Ok(require_group(group)?.to_string())
    }
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub resource_group: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub storage_api_version: Option<String>,
    #[serde(default)]
    pub compute_api_version: Option<String>,
    #[serde(default)]
    pub aggregate_timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("armstore").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective subscription (CLI > config > environment / Azure CLI profile)
    pub fn effective_subscription(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.subscription_id.clone())
            .or_else(get_default_subscription)
    }

    /// Get effective default group (CLI > config > environment / Azure CLI defaults)
    pub fn effective_group(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.resource_group.clone())
            .or_else(get_default_resource_group)
    }

    /// Freeze into a [`ClientConfig`]
    pub fn client_config(&self, subscription: Option<&str>, group: Option<&str>) -> Result<ClientConfig> {
        let subscription_id = self.effective_subscription(subscription).context(
            "No subscription configured. Pass --subscription, set AZURE_SUBSCRIPTION_ID or run 'az login'",
        )?;

        let mut config = ClientConfig::new(&subscription_id)
            .with_default_group(self.effective_group(group));

        if let Some(endpoint) = self.endpoint.as_deref() {
            config = config.with_endpoint(endpoint)?;
        }
        if let Some(version) = self.storage_api_version.clone() {
            config.storage_api_version = version;
        }
        if let Some(version) = self.compute_api_version.clone() {
            config.compute_api_version = version;
        }
        config.aggregate_timeout = self.aggregate_timeout_secs.map(Duration::from_secs);

        Ok(config)
    }
}
