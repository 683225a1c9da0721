//! Response envelope returned for every logical operation

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Location of an error within the query document (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub line: u32,
    pub column: u32,
}

/// Segment of the response path an error refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(i64),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// One structured GraphQL error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<ErrorLocation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: Vec<PathSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlErrorEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), locations: Vec::new(), path: Vec::new(), extensions: None }
    }

    /// Attach a machine-readable classification under `extensions.code`
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        let mut extensions = match self.extensions.take() {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        extensions.insert("code".to_string(), Value::String(code.into()));
        self.extensions = Some(Value::Object(extensions));
        self
    }

    /// `extensions.code`, when the server sent a string there
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }

    /// `a.b.0.c` rendering of the path, for logs
    pub fn path_display(&self) -> String {
        self.path.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
    }

    /// `line:column` pairs, for logs
    pub fn locations_display(&self) -> String {
        self.locations
            .iter()
            .map(|loc| format!("{}:{}", loc.line, loc.column))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Result of one logical operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlErrorEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlResponse {
    pub fn from_data(data: Value) -> Self {
        Self { data: Some(data), errors: Vec::new(), extensions: None }
    }

    pub fn from_errors(errors: Vec<GraphqlErrorEntry>) -> Self {
        Self { data: None, errors, extensions: None }
    }

    /// Returns `true` if no GraphQL errors were returned
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error entries classified with `code`
    pub fn errors_with_code<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Iterator<Item = &'a GraphqlErrorEntry> + 'a {
        self.errors.iter().filter(move |entry| entry.code() == Some(code))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
