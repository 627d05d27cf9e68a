//! Client-side validation
//!
//! Everything here runs before a request is built, so a rejected call never
//! reaches the network.

use crate::arm::error::{ArmError, ArmResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MIN_ACCOUNT_NAME_LEN: usize = 3;
pub const MAX_ACCOUNT_NAME_LEN: usize = 24;
pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_KEY_LEN: usize = 128;
pub const MAX_TAG_VALUE_LEN: usize = 256;

/// Storage account replication type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    #[serde(rename = "Standard_LRS")]
    StandardLrs,
    #[serde(rename = "Standard_ZRS")]
    StandardZrs,
    #[serde(rename = "Standard_GRS")]
    StandardGrs,
    #[serde(rename = "Standard_RAGRS")]
    StandardRagrs,
}

impl AccountType {
    pub const ALL: [AccountType; 4] = [
        AccountType::StandardLrs,
        AccountType::StandardZrs,
        AccountType::StandardGrs,
        AccountType::StandardRagrs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::StandardLrs => "Standard_LRS",
            AccountType::StandardZrs => "Standard_ZRS",
            AccountType::StandardGrs => "Standard_GRS",
            AccountType::StandardRagrs => "Standard_RAGRS",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = ArmError;

    /// Exact, case-sensitive match against the wire names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ArmError::InvalidAccountType(s.to_string()))
    }
}

/// Storage account names: 3-24 ASCII letters and digits
pub fn validate_account_name(name: &str) -> ArmResult<()> {
    let len = name.chars().count();
    if !(MIN_ACCOUNT_NAME_LEN..=MAX_ACCOUNT_NAME_LEN).contains(&len)
        || !name.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ArmError::InvalidAccountName(name.to_string()));
    }
    Ok(())
}

pub fn validate_tags(tags: &BTreeMap<String, String>) -> ArmResult<()> {
    if tags.len() > MAX_TAGS {
        return Err(ArmError::InvalidTags(format!(
            "at most {} tags are allowed, got {}",
            MAX_TAGS,
            tags.len()
        )));
    }
    for (key, value) in tags {
        if key.is_empty() || key.chars().count() > MAX_TAG_KEY_LEN {
            return Err(ArmError::InvalidTags(format!(
                "tag key '{}' must be 1-{} characters",
                key, MAX_TAG_KEY_LEN
            )));
        }
        if value.chars().count() > MAX_TAG_VALUE_LEN {
            return Err(ArmError::InvalidTags(format!(
                "value of tag '{}' exceeds {} characters",
                key, MAX_TAG_VALUE_LEN
            )));
        }
    }
    Ok(())
}

/// Fail with `MissingRequiredField(field)` on an empty value
pub fn require<'a>(value: &'a str, field: &'static str) -> ArmResult<&'a str> {
    if value.trim().is_empty() {
        return Err(ArmError::MissingRequiredField(field));
    }
    Ok(value)
}

/// Fail with `MissingResourceGroup` on an empty group
pub fn require_group(group: &str) -> ArmResult<&str> {
    if group.trim().is_empty() {
        return Err(ArmError::MissingResourceGroup);
    }
    Ok(group)
}

/// Parse `key=value` tag arguments
pub fn parse_tag(arg: &str) -> ArmResult<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ArmError::InvalidTags(format!(
            "expected key=value, got '{}'",
            arg
        ))),
    }
}
