//! Abstract type → concrete type table

use std::collections::{BTreeMap, BTreeSet};

use gqlink_domain::{GqlinkError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which concrete types can stand in for each interface or union.
///
/// Loaded from schema metadata shaped like `{"Node": ["User", "Post"]}`
/// (optionally wrapped as `{"possibleTypes": {...}}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PossibleTypes(BTreeMap<String, Vec<String>>);

impl PossibleTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON table
    ///
    /// # Errors
    /// Returns `GqlinkError::Serialization` if the document is not a map of
    /// type names to lists of type names
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| GqlinkError::Serialization(format!("possible types: {e}")))?;

        let table = match value {
            Value::Object(mut map) if map.len() == 1 && map.contains_key("possibleTypes") => {
                map.remove("possibleTypes").unwrap_or(Value::Null)
            }
            other => other,
        };

        serde_json::from_value(table)
            .map_err(|e| GqlinkError::Serialization(format!("possible types: {e}")))
    }

    pub fn insert(&mut self, supertype: impl Into<String>, subtypes: Vec<String>) {
        self.0.insert(supertype.into(), subtypes);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether an object of `typename` satisfies `type_condition`.
    ///
    /// Follows nested abstract types (an interface listed as a possible type
    /// of a union, for example).
    pub fn matches(&self, type_condition: &str, typename: &str) -> bool {
        if type_condition == typename {
            return true;
        }

        let mut seen = BTreeSet::new();
        let mut pending = vec![type_condition];
        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(subtypes) = self.0.get(current) {
                for subtype in subtypes {
                    if subtype == typename {
                        return true;
                    }
                    pending.push(subtype.as_str());
                }
            }
        }
        false
    }
}
