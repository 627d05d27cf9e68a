//! Storage Accounts
//!
//! Operations on `Microsoft.Storage/storageAccounts`. Every operation takes
//! the resource group explicitly; defaults are resolved by the caller.

use super::aggregate::AggregatingLister;
use super::record::StorageAccountRecord;
use super::scope::GroupScope;
use super::validate::{require, require_group, validate_account_name, validate_tags, AccountType};
use crate::arm::error::{ArmError, ArmResult};
use crate::arm::{GroupEnumerator, Transport, UrlBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const STORAGE_PROVIDER: &str = "Microsoft.Storage";
pub const STORAGE_ACCOUNTS: &str = "storageAccounts";
pub const DEFAULT_STORAGE_API_VERSION: &str = "2015-05-01-preview";

const LIST_KEYS: &str = "listKeys";
const REGENERATE_KEY: &str = "regenerateKey";

/// Access keys of a storage account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKeys {
    #[serde(alias = "key1")]
    pub primary_key: String,
    #[serde(alias = "key2")]
    pub secondary_key: String,
}

impl AccountKeys {
    /// Decode either `{primaryKey, secondaryKey}` (or `key1`/`key2`) or the
    /// newer `{"keys": [{"keyName": "key1", "value": ...}, ...]}` shape.
    pub fn from_response(response: Value) -> ArmResult<Self> {
        if let Some(keys) = response.get("keys").and_then(|k| k.as_array()) {
            let find = |name: &str| -> ArmResult<String> {
                keys.iter()
                    .find(|k| k.get("keyName").and_then(|n| n.as_str()) == Some(name))
                    .and_then(|k| k.get("value"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| ArmError::Decode(format!("key '{}' missing from response", name)))
            };
            return Ok(Self {
                primary_key: find("key1")?,
                secondary_key: find("key2")?,
            });
        }
        serde_json::from_value(response).map_err(ArmError::from)
    }
}

/// Which key `regenerate_key` rotates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyName {
    Key1,
    Key2,
}

impl KeyName {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyName::Key1 => "key1",
            KeyName::Key2 => "key2",
        }
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyName {
    type Err = ArmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "key1" => Ok(KeyName::Key1),
            "key2" => Ok(KeyName::Key2),
            other => Err(ArmError::InvalidArgument(format!(
                "key name must be key1 or key2, got '{}'",
                other
            ))),
        }
    }
}

/// Parameters of a create/update call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountParams {
    pub name: String,
    pub location: String,
    pub account_type: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl StorageAccountParams {
    pub fn new(name: &str, location: &str, account_type: &str) -> Self {
        Self {
            name: name.to_string(),
            location: location.to_string(),
            account_type: account_type.to_string(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// Check every field, returning the parsed account type
    pub fn validate(&self) -> ArmResult<AccountType> {
        require(&self.name, "name")?;
        require(&self.location, "location")?;
        let account_type = self.account_type.parse::<AccountType>()?;
        validate_account_name(&self.name)?;
        validate_tags(&self.tags)?;
        Ok(account_type)
    }

    fn to_body(&self, account_type: AccountType) -> Value {
        json!({
            "name": self.name,
            "location": self.location,
            "tags": self.tags,
            "properties": {
                "accountType": account_type,
            }
        })
    }
}

/// Storage account service
#[derive(Clone)]
pub struct StorageAccounts {
    scope: GroupScope,
    lister: AggregatingLister,
}

impl StorageAccounts {
    pub fn new(
        transport: Arc<dyn Transport>,
        groups: Arc<dyn GroupEnumerator>,
        endpoint: &str,
        subscription_id: &str,
        api_version: &str,
    ) -> Self {
        let urls = UrlBuilder::new(
            endpoint,
            subscription_id,
            STORAGE_PROVIDER,
            STORAGE_ACCOUNTS,
            api_version,
        );
        Self::with_urls(transport, groups, urls)
    }

    pub fn with_urls(
        transport: Arc<dyn Transport>,
        groups: Arc<dyn GroupEnumerator>,
        urls: UrlBuilder,
    ) -> Self {
        let scope = GroupScope::new(transport, urls);
        let lister = AggregatingLister::new(scope.clone(), groups);
        Self { scope, lister }
    }

    pub fn with_aggregate_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lister = self.lister.with_timeout(timeout);
        self
    }

    pub fn urls(&self) -> &UrlBuilder {
        self.scope.urls()
    }

    /// Fetch one account, optionally merging its keys into `properties`
    pub async fn get(
        &self,
        name: &str,
        group: &str,
        include_keys: bool,
    ) -> ArmResult<StorageAccountRecord> {
        require_group(group)?;
        let mut record = self.scope.get_record(name, group).await?;

        if include_keys {
            let keys = self.list_account_keys(name, group).await?;
            record
                .properties
                .insert("primaryKey".to_string(), Value::String(keys.primary_key));
            record
                .properties
                .insert("secondaryKey".to_string(), Value::String(keys.secondary_key));
        }

        Ok(record)
    }

    /// One group's accounts, or every group's accounts tagged with their group
    pub async fn list(&self, group: Option<&str>) -> ArmResult<Vec<StorageAccountRecord>> {
        self.lister.list(group).await
    }

    pub async fn list_all_for_subscription(&self) -> ArmResult<Vec<StorageAccountRecord>> {
        self.scope.list_subscription().await
    }

    /// Create (or overwrite) an account. Validation happens before any request.
    pub async fn create(&self, params: &StorageAccountParams, group: &str) -> ArmResult<Value> {
        require_group(group)?;
        let account_type = params.validate()?;

        tracing::info!(
            "Creating storage account '{}' in '{}' ({}, {})",
            params.name,
            group,
            params.location,
            account_type
        );
        let body = params.to_body(account_type);
        self.scope.put(group, &params.name, &body).await
    }

    /// Same request as `create`; ARM treats the PUT as an upsert
    pub async fn update(&self, params: &StorageAccountParams, group: &str) -> ArmResult<Value> {
        self.create(params, group).await
    }

    pub async fn delete(&self, name: &str, group: &str) -> ArmResult<Value> {
        require_group(group)?;
        tracing::info!("Deleting storage account '{}' in '{}'", name, group);
        self.scope.delete(group, name).await
    }

    pub async fn list_account_keys(&self, name: &str, group: &str) -> ArmResult<AccountKeys> {
        let response = self.scope.post(group, name, LIST_KEYS, None).await?;
        AccountKeys::from_response(response)
    }

    /// Rotate one key and return the account's keys afterwards
    pub async fn regenerate_key(
        &self,
        name: &str,
        group: &str,
        key: KeyName,
    ) -> ArmResult<AccountKeys> {
        require_group(group)?;
        tracing::info!("Regenerating {} of storage account '{}' in '{}'", key, name, group);
        let body = json!({ "keyName": key.as_str() });
        let response = self
            .scope
            .post(group, name, REGENERATE_KEY, Some(&body))
            .await?;
        AccountKeys::from_response(response)
    }
}
