//! Resource-group scoped request capability
//!
//! `GroupScope` pairs a pinned [`UrlBuilder`] with a [`Transport`]. Storage
//! accounts and snapshots each own one and build their operations on it.

use super::record::ResourceRecord;
use crate::arm::error::ArmResult;
use crate::arm::url::ResourceIdentity;
use crate::arm::{Transport, UrlBuilder};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct GroupScope {
    urls: UrlBuilder,
    transport: Arc<dyn Transport>,
}

impl GroupScope {
    pub fn new(transport: Arc<dyn Transport>, urls: UrlBuilder) -> Self {
        Self { urls, transport }
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    /// URL of `name` (and `action`) under `group`, or of the group's collection
    /// when `name` is `None`. Blank group or name never produces a URL.
    pub fn url(&self, group: &str, name: Option<&str>, action: Option<&str>) -> ArmResult<String> {
        let identity = ResourceIdentity::new(&self.urls, group, name)?;
        self.urls.build_for(&identity, action)
    }

    pub async fn get(&self, group: &str, name: Option<&str>) -> ArmResult<Value> {
        let url = self.url(group, name, None)?;
        self.transport.get(&url).await
    }

    pub async fn put(&self, group: &str, name: &str, body: &Value) -> ArmResult<Value> {
        let url = self.url(group, Some(name), None)?;
        self.transport.put(&url, body).await
    }

    /// POST to a resource action such as `listKeys`
    pub async fn post(
        &self,
        group: &str,
        name: &str,
        action: &str,
        body: Option<&Value>,
    ) -> ArmResult<Value> {
        let url = self.url(group, Some(name), Some(action))?;
        self.transport.post(&url, body).await
    }

    pub async fn delete(&self, group: &str, name: &str) -> ArmResult<Value> {
        let url = self.url(group, Some(name), None)?;
        self.transport.delete(&url).await
    }

    /// Fetch and decode one resource
    pub async fn get_record(&self, name: &str, group: &str) -> ArmResult<ResourceRecord> {
        let response = self.get(group, Some(name)).await?;
        ResourceRecord::from_value(response)
    }

    /// The `value` array of a single group's listing, untagged
    pub async fn list_group(&self, group: &str) -> ArmResult<Vec<ResourceRecord>> {
        let response = self.get(group, None).await?;
        ResourceRecord::from_listing(response)
    }

    /// Every resource of this type in the subscription
    pub async fn list_subscription(&self) -> ArmResult<Vec<ResourceRecord>> {
        let url = self.urls.build_subscription_wide();
        let response = self.transport.get(&url).await?;
        ResourceRecord::from_listing(response)
    }
}
