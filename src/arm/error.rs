//! Error types for Azure Resource Manager operations.

use crate::resource::ResourceRecord;
use thiserror::Error;

/// Result type for ARM operations.
pub type ArmResult<T> = Result<T, ArmError>;

/// A failed resource-group query inside an aggregated listing.
#[derive(Debug, Clone)]
pub struct GroupFailure {
    pub group: String,
    pub message: String,
}

impl std::fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.group, self.message)
    }
}

/// Errors raised by the ARM client and resource services.
#[derive(Error, Debug)]
pub enum ArmError {
    // ========================================================================
    // Validation (raised before any request is sent)
    // ========================================================================
    /// The operation needs a resource group and none was given.
    #[error("Resource group is required")]
    MissingResourceGroup,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid account type '{0}': expected one of Standard_LRS, Standard_ZRS, Standard_GRS, Standard_RAGRS")]
    InvalidAccountType(String),

    #[error("Invalid account name '{0}': must be 3-24 alphanumeric characters")]
    InvalidAccountName(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Invalid tags: {0}")]
    InvalidTags(String),

    // ========================================================================
    // Remote
    // ========================================================================
    /// Network failure or non-2xx response.
    #[error("API request failed: {message}")]
    Transport {
        /// HTTP status, absent when no response was received
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Aggregation
    // ========================================================================
    /// One or more groups failed during a multi-group listing.
    ///
    /// `records` holds everything collected from the groups that succeeded.
    #[error("{} resource group(s) failed: {}", .failures.len(), join_failures(.failures))]
    GroupsFailed {
        failures: Vec<GroupFailure>,
        records: Vec<ResourceRecord>,
    },
}

fn join_failures(failures: &[GroupFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ArmError {
    /// HTTP status of a transport failure, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ArmError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// True for errors raised by local validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ArmError::MissingResourceGroup
                | ArmError::InvalidArgument(_)
                | ArmError::InvalidAccountType(_)
                | ArmError::InvalidAccountName(_)
                | ArmError::MissingRequiredField(_)
                | ArmError::InvalidTags(_)
        )
    }
}

impl From<serde_json::Error> for ArmError {
    fn from(err: serde_json::Error) -> Self {
        ArmError::Decode(err.to_string())
    }
}
