//! Logical GraphQL operations and their per-request context

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::impl_keyword_conversions;

/// Kind of GraphQL operation, taken from the document's leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl_keyword_conversions!(OperationKind {
    Query => "query",
    Mutation => "mutation",
    Subscription => "subscription",
});

/// How a query consults the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
    /// Serve from the cache when the full result is present, else fetch
    #[default]
    CacheFirst,
    /// Always fetch, then write the result to the cache
    NetworkOnly,
}

impl_keyword_conversions!(FetchPolicy {
    CacheFirst => "cache-first",
    NetworkOnly => "network-only",
});

/// Mutable request metadata carried alongside an operation.
///
/// Never serialized into the request body; links use it to shape the
/// physical HTTP request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationContext {
    headers: BTreeMap<String, String>,
    /// Free-form values links can use to talk to each other
    pub extensions: Map<String, Value>,
}

impl OperationContext {
    /// Set a header, replacing any existing value under a case-insensitive
    /// match of the name
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let key = self.headers.keys().find(|existing| existing.eq_ignore_ascii_case(name)).cloned()?;
        self.headers.remove(&key)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Key used by the batching transport: operations only share a physical
    /// call when they would send identical headers.
    pub fn batch_key(&self) -> String {
        self.headers
            .iter()
            .map(|(name, value)| format!("{}:{}", name.to_ascii_lowercase(), value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single logical GraphQL request.
///
/// The serialized form is exactly one entry of a batched request body:
/// `{"query": ..., "variables": ..., "operationName": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub query: String,
    #[serde(default = "empty_variables")]
    pub variables: Value,
    #[serde(rename = "operationName", default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip)]
    pub context: OperationContext,
}

fn empty_variables() -> Value {
    Value::Object(Map::new())
}

impl Operation {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: empty_variables(),
            operation_name: None,
            context: OperationContext::default(),
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = if variables.is_null() { empty_variables() } else { variables };
        self
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.set_header(name, value);
        self
    }

    /// Kind of the first executable definition in the document.
    ///
    /// Fragment definitions are skipped; an anonymous `{ ... }` selection
    /// is a query.
    pub fn kind(&self) -> OperationKind {
        let mut depth = 0usize;
        let mut word = String::new();
        let mut fragment_header = false;

        for line in self.query.lines() {
            let line = line.split('#').next().unwrap_or_default();
            for ch in line.chars().chain(std::iter::once(' ')) {
                if ch.is_alphanumeric() || ch == '_' {
                    word.push(ch);
                    continue;
                }
                if depth == 0 {
                    match word.as_str() {
                        "query" if !fragment_header => return OperationKind::Query,
                        "mutation" if !fragment_header => return OperationKind::Mutation,
                        "subscription" if !fragment_header => {
                            return OperationKind::Subscription;
                        }
                        "fragment" => fragment_header = true,
                        _ => {}
                    }
                }
                word.clear();
                match ch {
                    '{' => {
                        // Top-level brace not introduced by a fragment is the
                        // query shorthand.
                        if depth == 0 && !fragment_header {
                            return OperationKind::Query;
                        }
                        fragment_header = false;
                        depth += 1;
                    }
                    '}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
        }

        OperationKind::Query
    }

    /// Whether the document's first operation is a `mutation`
    pub fn is_mutation(&self) -> bool {
        self.kind() == OperationKind::Mutation
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serializes_as_batch_entry() {
        let op = Operation::new("query Viewer { viewer { id } }")
            .with_variables(json!({ "first": 10 }))
            .with_operation_name("Viewer")
            .with_header("Authorization", "Bearer abc");

        let body = serde_json::to_value(&op).unwrap();
        assert_eq!(
            body,
            json!({
                "query": "query Viewer { viewer { id } }",
                "variables": { "first": 10 },
                "operationName": "Viewer"
            })
        );
    }

    #[test]
    fn test_null_variables_become_empty_object() {
        let op = Operation::new("{ a }").with_variables(Value::Null);
        assert_eq!(op.variables, json!({}));
    }

    #[test]
    fn test_kind_detection() {
        assert_eq!(Operation::new("{ viewer { id } }").kind(), OperationKind::Query);
        assert_eq!(Operation::new("query Q { a }").kind(), OperationKind::Query);
        assert_eq!(
            Operation::new("  mutation M($x: Int) { bump(x: $x) }").kind(),
            OperationKind::Mutation
        );
        assert_eq!(Operation::new("subscription S { tick }").kind(), OperationKind::Subscription);
    }

    #[test]
    fn test_kind_skips_comments_and_fragments() {
        let doc = "# query in a comment\nfragment F on User {\n  id\n}\nmutation Save { save { ...F } }";
        assert_eq!(Operation::new(doc).kind(), OperationKind::Mutation);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let mut context = OperationContext::default();
        context.set_header("authorization", "Bearer one");
        context.set_header("Authorization", "Bearer two");

        assert_eq!(context.headers().len(), 1);
        assert_eq!(context.header("AUTHORIZATION"), Some("Bearer two"));
        assert_eq!(context.remove_header("authorization"), Some("Bearer two".to_string()));
        assert!(context.header("Authorization").is_none());
    }

    #[test]
    fn test_batch_key_depends_on_headers() {
        let anonymous = Operation::new("{ a }");
        let alice = Operation::new("{ a }").with_header("Authorization", "Bearer alice");
        let alice_again = Operation::new("{ b }").with_header("authorization", "Bearer alice");

        assert_ne!(anonymous.context.batch_key(), alice.context.batch_key());
        assert_eq!(alice.context.batch_key(), alice_again.context.batch_key());
    }

    #[test]
    fn test_fetch_policy_parsing() {
        assert_eq!("network-only".parse::<FetchPolicy>().unwrap(), FetchPolicy::NetworkOnly);
        assert_eq!(FetchPolicy::default(), FetchPolicy::CacheFirst);
    }
}
