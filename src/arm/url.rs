//! Versioned resource URL construction
//!
//! Every ARM request targets
//! `<endpoint>/subscriptions/<sub>/resourceGroups/<group>/providers/<ns>/<type>[/<seg>...]?api-version=<v>`
//! or the subscription-wide form without the `resourceGroups/<group>` part.

use super::error::{ArmError, ArmResult};

/// Public Azure Resource Manager endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Identity of a resource (or resource collection) addressed by a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider_namespace: String,
    pub resource_type: String,
    pub resource_name: Option<String>,
}

impl ResourceIdentity {
    /// Build an identity, rejecting empty group or name.
    pub fn new(
        builder: &UrlBuilder,
        resource_group: &str,
        resource_name: Option<&str>,
    ) -> ArmResult<Self> {
        if resource_group.trim().is_empty() {
            return Err(ArmError::MissingResourceGroup);
        }
        if let Some(name) = resource_name {
            if name.trim().is_empty() {
                return Err(ArmError::InvalidArgument(
                    "resource name must not be empty".to_string(),
                ));
            }
        }
        Ok(Self {
            subscription_id: builder.subscription_id.clone(),
            resource_group: resource_group.to_string(),
            provider_namespace: builder.provider_namespace.clone(),
            resource_type: builder.resource_type.clone(),
            resource_name: resource_name.map(str::to_string),
        })
    }
}

/// Builds URLs for one provider/resource-type pair at a pinned API version.
///
/// All fields are fixed at construction; a builder never changes version.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    endpoint: String,
    subscription_id: String,
    provider_namespace: String,
    resource_type: String,
    api_version: String,
}

impl UrlBuilder {
    pub fn new(
        endpoint: &str,
        subscription_id: &str,
        provider_namespace: &str,
        resource_type: &str,
        api_version: &str,
    ) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            subscription_id: subscription_id.to_string(),
            provider_namespace: provider_namespace.to_string(),
            resource_type: resource_type.to_string(),
            api_version: api_version.to_string(),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn provider_namespace(&self) -> &str {
        &self.provider_namespace
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// `<endpoint>/subscriptions/<sub>`
    pub fn common_root(&self) -> String {
        format!("{}/subscriptions/{}", self.endpoint, self.subscription_id)
    }

    /// Build a group-scoped URL, appending `segments` in order.
    pub fn build(&self, resource_group: &str, segments: &[&str]) -> ArmResult<String> {
        if resource_group.trim().is_empty() {
            return Err(ArmError::InvalidArgument(
                "resource group must not be empty".to_string(),
            ));
        }

        let mut url = format!(
            "{}/resourceGroups/{}/providers/{}/{}",
            self.common_root(),
            urlencoding::encode(resource_group),
            self.provider_namespace,
            self.resource_type
        );

        for segment in segments {
            if segment.is_empty() {
                return Err(ArmError::InvalidArgument(
                    "path segment must not be empty".to_string(),
                ));
            }
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }

        Ok(self.with_version(url))
    }

    /// Build the URL for an identity (collection or single resource).
    pub fn build_for(&self, identity: &ResourceIdentity, action: Option<&str>) -> ArmResult<String> {
        let mut segments: Vec<&str> = Vec::new();
        if let Some(name) = identity.resource_name.as_deref() {
            segments.push(name);
        }
        if let Some(action) = action {
            segments.push(action);
        }
        self.build(&identity.resource_group, &segments)
    }

    /// Subscription-wide listing URL.
    pub fn build_subscription_wide(&self) -> String {
        self.with_version(format!(
            "{}/providers/{}/{}",
            self.common_root(),
            self.provider_namespace,
            self.resource_type
        ))
    }

    fn with_version(&self, url: String) -> String {
        format!("{}?api-version={}", url, self.api_version)
    }
}
