//! Resource Groups
//!
//! Listing the resource groups of a subscription.

use super::error::{ArmError, ArmResult};
use super::Transport;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// API version used for resource group enumeration
pub const RESOURCE_GROUPS_API_VERSION: &str = "2015-11-01";

/// Resource group information
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResourceGroup {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Source of the resource groups to fan out over.
///
/// Returns a finite, possibly empty sequence in no particular order.
#[async_trait]
pub trait GroupEnumerator: Send + Sync {
    async fn list_resource_groups(&self) -> ArmResult<Vec<ResourceGroup>>;
}

/// Enumerates groups through `GET /subscriptions/<sub>/resourcegroups`
#[derive(Clone)]
pub struct ArmGroupEnumerator {
    transport: Arc<dyn Transport>,
    url: String,
}

impl ArmGroupEnumerator {
    pub fn new(transport: Arc<dyn Transport>, endpoint: &str, subscription_id: &str) -> Self {
        let url = format!(
            "{}/subscriptions/{}/resourcegroups?api-version={}",
            endpoint.trim_end_matches('/'),
            subscription_id,
            RESOURCE_GROUPS_API_VERSION
        );
        Self { transport, url }
    }
}

#[async_trait]
impl GroupEnumerator for ArmGroupEnumerator {
    async fn list_resource_groups(&self) -> ArmResult<Vec<ResourceGroup>> {
        let response = self.transport.get(&self.url).await?;
        parse_groups(response)
    }
}

fn parse_groups(response: Value) -> ArmResult<Vec<ResourceGroup>> {
    let items = match response.get("value") {
        Some(Value::Array(items)) => items.clone(),
        Some(_) => {
            return Err(ArmError::Decode(
                "resource group listing 'value' is not an array".to_string(),
            ))
        }
        None => Vec::new(),
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value::<ResourceGroup>(item).map_err(ArmError::from))
        .collect()
}

/// Get group names as a simple list
pub async fn list_group_names(enumerator: &dyn GroupEnumerator) -> ArmResult<Vec<String>> {
    let groups = enumerator.list_resource_groups().await?;
    Ok(groups.into_iter().map(|g| g.name).collect())
}
