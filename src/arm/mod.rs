//! Azure Resource Manager interaction module
//!
//! This module provides the core functionality for talking to the ARM REST
//! API: authentication, the HTTP client, URL construction and resource group
//! enumeration.
//!
//! # Module Structure
//!
//! - [`auth`] - Bearer tokens from `AZURE_ACCESS_TOKEN` or the Azure CLI
//! - [`client`] - Main ARM client, the production [`Transport`]
//! - [`error`] - Error taxonomy shared by the whole crate
//! - [`groups`] - Resource group enumeration
//! - [`http`] - HTTP utilities for REST API calls
//! - [`url`] - Versioned resource URL construction
//!
//! # Example
//!
//! ```ignore
//! use armstore::arm::{ArmClient, Credentials};
//!
//! async fn example() -> armstore::arm::ArmResult<()> {
//!     let client = ArmClient::new(Credentials::static_token("token"))?;
//!     let groups = client.get("https://management.azure.com/...").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod groups;
pub mod http;
pub mod url;

use async_trait::async_trait;
use serde_json::Value;

pub use auth::Credentials;
pub use client::ArmClient;
pub use error::{ArmError, ArmResult, GroupFailure};
pub use groups::{ArmGroupEnumerator, GroupEnumerator, ResourceGroup};
pub use url::{ResourceIdentity, UrlBuilder, DEFAULT_ENDPOINT};

/// The request capability every resource service is built on.
///
/// Each call either yields the decoded body (`Null` for an empty body) or
/// fails with [`ArmError::Transport`] / [`ArmError::Decode`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> ArmResult<Value>;

    async fn put(&self, url: &str, body: &Value) -> ArmResult<Value>;

    async fn post(&self, url: &str, body: Option<&Value>) -> ArmResult<Value>;

    async fn delete(&self, url: &str) -> ArmResult<Value>;
}
