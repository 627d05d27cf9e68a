//! Azure Authentication
//!
//! Obtains bearer tokens for the management endpoint, either from an explicit
//! token (`AZURE_ACCESS_TOKEN`) or from the Azure CLI, and reads the default
//! subscription and resource group from the local Azure CLI profile.

use super::error::{ArmError, ArmResult};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Where access tokens come from
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A fixed token, used as-is
    Static(String),
    /// `az account get-access-token --resource <resource>`
    AzureCli { resource: String },
}

/// Azure credentials holder with token caching
#[derive(Clone)]
pub struct Credentials {
    source: Arc<TokenSource>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Output of `az account get-access-token`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// Local time, e.g. `2024-05-01 12:34:56.000000`
    #[serde(default)]
    expires_on: Option<String>,
    /// Epoch seconds, emitted by newer CLI versions
    #[serde(default, rename = "expires_on")]
    expires_on_epoch: Option<i64>,
}

impl Credentials {
    pub fn new(source: TokenSource) -> Self {
        Self {
            source: Arc::new(source),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Credentials that always return `token`
    pub fn static_token(token: &str) -> Self {
        Self::new(TokenSource::Static(token.to_string()))
    }

    /// `AZURE_ACCESS_TOKEN` when set, otherwise the Azure CLI for `endpoint`
    pub fn from_env(endpoint: &str) -> Self {
        match std::env::var("AZURE_ACCESS_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Self::static_token(token.trim()),
            _ => Self::new(TokenSource::AzureCli {
                resource: format!("{}/", endpoint.trim_end_matches('/')),
            }),
        }
    }

    /// Get an access token for API calls
    /// Security: Checks token expiry before returning cached token
    pub async fn get_token(&self) -> ArmResult<String> {
        if let TokenSource::Static(token) = self.source.as_ref() {
            return Ok(token.clone());
        }

        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let (token, ttl) = self.fetch_token().await?;
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }

    async fn fetch_token(&self) -> ArmResult<(String, Duration)> {
        match self.source.as_ref() {
            TokenSource::Static(token) => Ok((token.clone(), DEFAULT_TOKEN_TTL)),
            TokenSource::AzureCli { resource } => {
                tracing::info!("Executing: az account get-access-token --resource {}", resource);
                let output = tokio::process::Command::new("az")
                    .args(["account", "get-access-token", "--resource", resource.as_str(), "-o", "json"])
                    .output()
                    .await
                    .map_err(|e| ArmError::Auth(format!("Failed to run Azure CLI: {}", e)))?;

                if !output.status.success() {
                    return Err(ArmError::Auth(
                        "Azure CLI could not issue a token. Run 'az login'".to_string(),
                    ));
                }

                let parsed: CliToken = serde_json::from_slice(&output.stdout)
                    .map_err(|e| ArmError::Auth(format!("Unexpected Azure CLI output: {}", e)))?;
                let ttl = token_ttl(&parsed, chrono::Local::now());
                Ok((parsed.access_token, ttl))
            }
        }
    }
}

/// Remaining lifetime of a CLI token relative to `now`
fn token_ttl(token: &CliToken, now: chrono::DateTime<chrono::Local>) -> Duration {
    let expiry = token
        .expires_on_epoch
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.with_timezone(&chrono::Local))
        .or_else(|| {
            token.expires_on.as_deref().and_then(|s| {
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .ok()
                    .and_then(|naive| naive.and_local_timezone(chrono::Local).single())
            })
        });

    match expiry {
        Some(at) => (at - now).to_std().unwrap_or(Duration::ZERO),
        None => DEFAULT_TOKEN_TTL,
    }
}

/// Get the Azure CLI configuration directory
pub fn get_azure_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AZURE_CONFIG_DIR") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|p| p.join(".azure"))
}

/// Validate a subscription id (a GUID)
fn validate_subscription_id(id: &str) -> bool {
    uuid::Uuid::parse_str(id).is_ok()
}

/// Validate a resource group name: 1-90 chars of alphanumerics, `-_.()`, not ending in `.`
pub fn validate_resource_group(group: &str) -> bool {
    !group.is_empty()
        && group.len() <= 90
        && !group.ends_with('.')
        && group
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')'))
}

#[derive(Debug, Deserialize)]
struct AzureProfile {
    #[serde(default)]
    subscriptions: Vec<ProfileSubscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSubscription {
    id: String,
    #[serde(default)]
    is_default: bool,
}

/// Read the default subscription
/// Security: Validates the subscription id format before returning
pub fn get_default_subscription() -> Option<String> {
    if let Ok(sub) = std::env::var("AZURE_SUBSCRIPTION_ID") {
        if validate_subscription_id(&sub) {
            return Some(sub);
        }
        tracing::warn!("Invalid subscription id format in AZURE_SUBSCRIPTION_ID");
    }

    let path = get_azure_config_dir()?.join("azureProfile.json");
    let content = std::fs::read_to_string(path).ok()?;
    default_subscription_from_profile(&content)
}

fn default_subscription_from_profile(content: &str) -> Option<String> {
    // The CLI writes this file with a UTF-8 BOM
    let profile: AzureProfile = serde_json::from_str(content.trim_start_matches('\u{feff}')).ok()?;
    profile
        .subscriptions
        .into_iter()
        .find(|s| s.is_default)
        .map(|s| s.id)
        .filter(|id| validate_subscription_id(id))
}

/// Read the default resource group (`az configure --defaults group=...`)
pub fn get_default_resource_group() -> Option<String> {
    for var in ["AZURE_RESOURCE_GROUP", "AZURE_DEFAULTS_GROUP"] {
        if let Ok(group) = std::env::var(var) {
            if validate_resource_group(&group) {
                return Some(group);
            }
            tracing::warn!("Invalid resource group name in {}", var);
        }
    }

    let path = get_azure_config_dir()?.join("config");
    let content = std::fs::read_to_string(path).ok()?;
    default_group_from_cli_config(&content)
}

fn default_group_from_cli_config(content: &str) -> Option<String> {
    let mut in_defaults = false;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_defaults = line == "[defaults]";
        } else if in_defaults {
            if let Some((key, value)) = line.split_once('=') {
                if key.trim() == "group" {
                    let group = value.trim();
                    if validate_resource_group(group) {
                        return Some(group.to_string());
                    }
                }
            }
        }
    }
    None
}
