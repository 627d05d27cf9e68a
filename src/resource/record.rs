//! Resource records as returned by ARM

use super::validate::AccountType;
use crate::arm::error::{ArmError, ArmResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A tracked ARM resource (storage account, snapshot, ...).
///
/// Fields the client doesn't model (`id`, `type`, `sku`, ...) are kept in
/// `extra` and written back unchanged on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub tags: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Map<String, Value>,
    /// Set by the aggregating lister only
    #[serde(
        rename = "resourceGroup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_group: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type StorageAccountRecord = ResourceRecord;
pub type SnapshotRecord = ResourceRecord;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResourceRecord {
    /// Decode a single record from a response body
    pub fn from_value(value: Value) -> ArmResult<Self> {
        serde_json::from_value(value).map_err(ArmError::from)
    }

    /// Decode the `value` array of a listing response, keeping its order.
    /// A response without `value` is an empty listing.
    pub fn from_listing(response: Value) -> ArmResult<Vec<Self>> {
        match response {
            Value::Object(mut map) => match map.remove("value") {
                Some(Value::Array(items)) => items.into_iter().map(Self::from_value).collect(),
                Some(Value::Null) | None => Ok(Vec::new()),
                Some(_) => Err(ArmError::Decode(
                    "listing 'value' is not an array".to_string(),
                )),
            },
            Value::Null => Ok(Vec::new()),
            _ => Err(ArmError::Decode(
                "listing response is not an object".to_string(),
            )),
        }
    }

    /// `properties.accountType`, when it names a known type
    pub fn account_type(&self) -> Option<AccountType> {
        self.properties
            .get("accountType")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }

    /// Resource group parsed from the ARM `id`, e.g.
    /// `/subscriptions/s/resourceGroups/rg/providers/...` -> `rg`
    pub fn group_from_id(&self) -> Option<&str> {
        let id = self.extra.get("id")?.as_str()?;
        let mut parts = id.split('/');
        while let Some(part) = parts.next() {
            if part.eq_ignore_ascii_case("resourceGroups") {
                return parts.next().filter(|g| !g.is_empty());
            }
        }
        None
    }

    /// Fill `resource_group` from the ARM `id` when it isn't already set
    pub fn with_group_from_id(mut self) -> Self {
        if self.resource_group.is_none() {
            self.resource_group = self.group_from_id().map(str::to_string);
        }
        self
    }
}
