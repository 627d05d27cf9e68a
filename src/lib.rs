//! armstore
//!
//! Client for Azure Resource Manager storage accounts and snapshots.
//!
//! - [`arm`] - transport, authentication, URLs and resource group enumeration
//! - [`resource`] - typed services and the multi-group aggregating lister
//! - [`config`] - persisted settings and the immutable client configuration

pub mod arm;
pub mod config;
pub mod resource;

pub use arm::{ArmError, ArmResult};
pub use config::{ClientConfig, Config};
pub use resource::ResourceClient;
