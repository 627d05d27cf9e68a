//! Resource services
//!
//! Typed operations on storage accounts and snapshots, built by composition:
//! each service owns a [`GroupScope`] (pinned URL builder plus transport) and
//! an [`AggregatingLister`] for multi-group listings.
//!
//! # Architecture
//!
//! - [`scope`] - Resource-group scoped request capability
//! - [`aggregate`] - Concurrent fan-out over every resource group
//! - [`storage`] - `Microsoft.Storage/storageAccounts`
//! - [`snapshot`] - `Microsoft.Compute/snapshots`
//! - [`record`] - Decoded resource records
//! - [`validate`] - Client-side argument validation
//!
//! # Example
//!
//! ```ignore
//! use armstore::config::ClientConfig;
//! use armstore::arm::Credentials;
//! use armstore::resource::ResourceClient;
//!
//! async fn all_accounts(config: &ClientConfig) -> armstore::arm::ArmResult<()> {
//!     let client = ResourceClient::new(config, Credentials::from_env(&config.endpoint))?;
//!     let accounts = client.storage.list(None).await?;
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod record;
pub mod scope;
pub mod snapshot;
pub mod storage;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

use crate::arm::error::ArmResult;
use crate::arm::{ArmClient, ArmGroupEnumerator, Credentials, GroupEnumerator, Transport};
use crate::config::ClientConfig;
use std::sync::Arc;

pub use aggregate::{Accumulator, AggregatingLister};
pub use record::{ResourceRecord, SnapshotRecord, StorageAccountRecord};
pub use scope::GroupScope;
pub use snapshot::{SnapshotParams, Snapshots};
pub use storage::{AccountKeys, KeyName, StorageAccountParams, StorageAccounts};
pub use validate::AccountType;

/// Storage account and snapshot services sharing one transport
#[derive(Clone)]
pub struct ResourceClient {
    pub storage: StorageAccounts,
    pub snapshots: Snapshots,
    pub groups: Arc<dyn GroupEnumerator>,
}

impl ResourceClient {
    /// Build the services over an authenticated [`ArmClient`]
    pub fn new(config: &ClientConfig, credentials: Credentials) -> ArmResult<Self> {
        let transport: Arc<dyn Transport> = Arc::new(ArmClient::new(credentials)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let groups: Arc<dyn GroupEnumerator> = Arc::new(ArmGroupEnumerator::new(
            transport.clone(),
            &config.endpoint,
            &config.subscription_id,
        ));

        let storage = StorageAccounts::new(
            transport.clone(),
            groups.clone(),
            &config.endpoint,
            &config.subscription_id,
            &config.storage_api_version,
        )
        .with_aggregate_timeout(config.aggregate_timeout);

        let snapshots = Snapshots::new(
            transport,
            groups.clone(),
            &config.endpoint,
            &config.subscription_id,
            &config.compute_api_version,
        )
        .with_aggregate_timeout(config.aggregate_timeout);

        Self {
            storage,
            snapshots,
            groups,
        }
    }
}
