//! Snapshots
//!
//! Operations on `Microsoft.Compute/snapshots`, built on the same
//! [`GroupScope`] and [`AggregatingLister`] as storage accounts.

use super::aggregate::AggregatingLister;
use super::record::SnapshotRecord;
use super::scope::GroupScope;
use super::validate::{require, require_group, validate_tags};
use crate::arm::error::ArmResult;
use crate::arm::{GroupEnumerator, Transport, UrlBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const COMPUTE_PROVIDER: &str = "Microsoft.Compute";
pub const SNAPSHOTS: &str = "snapshots";
pub const DEFAULT_COMPUTE_API_VERSION: &str = "2016-04-30-preview";

/// Parameters of a snapshot create/update call.
///
/// `properties` is sent as-is, e.g.
/// `{"creationData": {"createOption": "Copy", "sourceUri": "..."}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotParams {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl SnapshotParams {
    pub fn new(name: &str, location: &str) -> Self {
        Self {
            name: name.to_string(),
            location: location.to_string(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    pub fn validate(&self) -> ArmResult<()> {
        require(&self.name, "name")?;
        require(&self.location, "location")?;
        validate_tags(&self.tags)
    }

    fn to_body(&self) -> Value {
        json!({
            "name": self.name,
            "location": self.location,
            "tags": self.tags,
            "properties": self.properties,
        })
    }
}

#[derive(Clone)]
pub struct Snapshots {
    scope: GroupScope,
    lister: AggregatingLister,
}

impl Snapshots {
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
            COMPUTE_PROVIDER,
            SNAPSHOTS,
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

    pub async fn get(&self, name: &str, group: &str) -> ArmResult<SnapshotRecord> {
        self.scope.get_record(name, group).await
    }

    pub async fn list(&self, group: Option<&str>) -> ArmResult<Vec<SnapshotRecord>> {
        self.lister.list(group).await
    }

    pub async fn list_all_for_subscription(&self) -> ArmResult<Vec<SnapshotRecord>> {
        self.scope.list_subscription().await
    }

    pub async fn create(&self, params: &SnapshotParams, group: &str) -> ArmResult<Value> {
        require_group(group)?;
        params.validate()?;
        tracing::info!(
            "Creating snapshot '{}' in '{}' ({})",
            params.name,
            group,
            params.location
        );
        self.scope.put(group, &params.name, &params.to_body()).await
    }

    pub async fn update(&self, params: &SnapshotParams, group: &str) -> ArmResult<Value> {
        self.create(params, group).await
    }

    pub async fn delete(&self, name: &str, group: &str) -> ArmResult<Value> {
        require_group(group)?;
        tracing::info!("Deleting snapshot '{}' in '{}'", name, group);
        self.scope.delete(group, name).await
    }
}
