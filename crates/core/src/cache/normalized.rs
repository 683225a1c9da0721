//! Entity normalization and result reconstruction

use std::collections::HashMap;

use gqlink_domain::constants::{REF_FIELD, SELECTION_FIELD, TYPENAME_FIELD};
use gqlink_domain::Operation;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::possible_types::PossibleTypes;

type Entities = HashMap<String, Map<String, Value>>;

/// Normalized result of one query plus the shape it selected.
///
/// A shape mirrors the written data: objects map field names to the shape
/// of their value, leaves are `null`.
struct StoredRoot {
    data: Value,
    shape: Value,
}

#[derive(Default)]
struct CacheState {
    entities: Entities,
    roots: HashMap<String, StoredRoot>,
}

/// Process-local normalized cache.
///
/// Query results are stored per operation (query text + variables) with
/// every identifiable object replaced by a reference into the entity table.
/// Reads project entities through the shape the reading query wrote, so
/// they return exactly that shape with the entities' latest field values,
/// whatever narrower selections other queries wrote since.
pub struct InMemoryCache {
    possible_types: PossibleTypes,
    state: RwLock<CacheState>,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(PossibleTypes::default())
    }
}

impl InMemoryCache {
    /// Empty cache resolving fragment matches through `possible_types`
    pub fn new(possible_types: PossibleTypes) -> Self {
        Self { possible_types, state: RwLock::new(CacheState::default()) }
    }

    pub fn possible_types(&self) -> &PossibleTypes {
        &self.possible_types
    }

    /// Key a query result is stored under
    pub fn cache_key(operation: &Operation) -> String {
        let query = operation.query.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("{query}|{}", operation.variables)
    }

    /// `Typename:id` for objects that carry both
    pub fn identify(object: &Map<String, Value>) -> Option<String> {
        let typename = object.get(TYPENAME_FIELD)?.as_str()?;
        let id = ["id", "_id", "databaseId"].iter().find_map(|field| match object.get(*field)? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })?;
        Some(format!("{typename}:{id}"))
    }

    /// Store the result of `operation`, merging its entities
    pub fn write_query(&self, operation: &Operation, data: &Value) {
        let mut state = self.state.write();
        let (root, shape) = normalize(data, &mut state.entities);
        state.roots.insert(Self::cache_key(operation), StoredRoot { data: root, shape });
        debug!(entities = state.entities.len(), "Cached query result");
    }

    /// Merge the entities found in `data` without storing a query root
    /// (mutation results). Returns the number of entity writes.
    pub fn write_entities(&self, data: &Value) -> usize {
        let mut state = self.state.write();
        let writes = count_refs(data);
        normalize(data, &mut state.entities);
        writes
    }

    /// Rebuild the stored result of `operation`.
    ///
    /// Returns `None` when nothing is stored or any entity or field the
    /// query selected is no longer in the cache.
    pub fn read_query(&self, operation: &Operation) -> Option<Value> {
        let state = self.state.read();
        let root = state.roots.get(&Self::cache_key(operation))?;
        resolve(&root.data, &root.shape, &state.entities)
    }

    /// Raw normalized entity
    pub fn entity(&self, key: &str) -> Option<Value> {
        self.state.read().entities.get(key).cloned().map(Value::Object)
    }

    /// Keys of entities whose `__typename` satisfies `type_condition`
    pub fn entities_of_type(&self, type_condition: &str) -> Vec<String> {
        let state = self.state.read();
        let mut keys: Vec<String> = state
            .entities
            .iter()
            .filter(|(_, entity)| {
                entity
                    .get(TYPENAME_FIELD)
                    .and_then(Value::as_str)
                    .is_some_and(|typename| self.possible_types.matches(type_condition, typename))
            })
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Drop one entity. Results referencing it stop being readable.
    pub fn evict(&self, key: &str) -> bool {
        self.state.write().entities.remove(key).is_some()
    }

    /// Drop everything
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.entities.clear();
        state.roots.clear();
    }

    /// Number of stored entities
    pub fn len(&self) -> usize {
        self.state.read().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn count_refs(value: &Value) -> usize {
    match value {
        Value::Object(map) => {
            let own = usize::from(InMemoryCache::identify(map).is_some());
            own + map.values().map(count_refs).sum::<usize>()
        }
        Value::Array(items) => items.iter().map(count_refs).sum(),
        _ => 0,
    }
}

/// Replace identifiable objects by references, returning the normalized
/// value and the shape of `value`.
fn normalize(value: &Value, entities: &mut Entities) -> (Value, Value) {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            let mut shape = Map::new();
            for (field, child) in map {
                let (normalized, child_shape) = normalize(child, entities);
                out.insert(field.clone(), normalized);
                shape.insert(field.clone(), child_shape);
            }
            let shape = Value::Object(shape);

            match InMemoryCache::identify(&out) {
                Some(key) => {
                    entities.entry(key.clone()).or_default().extend(out);
                    (json!({ REF_FIELD: key, SELECTION_FIELD: shape }), shape)
                }
                None => (Value::Object(out), shape),
            }
        }
        Value::Array(items) => {
            let mut shape = Value::Null;
            let normalized = items
                .iter()
                .map(|item| {
                    let (normalized, item_shape) = normalize(item, entities);
                    merge_shape(&mut shape, item_shape);
                    normalized
                })
                .collect();
            (Value::Array(normalized), shape)
        }
        other => (other.clone(), Value::Null),
    }
}

/// Union of two shapes (list items may select different fields)
fn merge_shape(into: &mut Value, other: Value) {
    if into.is_null() {
        *into = other;
        return;
    }
    if let (Value::Object(target), Value::Object(fields)) = (into, other) {
        for (field, shape) in fields {
            merge_shape(target.entry(field).or_insert(Value::Null), shape);
        }
    }
}

/// Rebuild `value` as selected by `shape`.
///
/// Entity fields are looked up through `shape`, never through the
/// selection stored in a nested reference: another query may have written
/// a narrower one since.
fn resolve(value: &Value, shape: &Value, entities: &Entities) -> Option<Value> {
    match value {
        Value::Object(map) => {
            let source = match map.get(REF_FIELD).and_then(Value::as_str) {
                Some(key) => entities.get(key)?,
                None => map,
            };
            let selection =
                shape.as_object().or_else(|| map.get(SELECTION_FIELD).and_then(Value::as_object));

            let mut out = Map::new();
            match selection {
                Some(fields) => {
                    for (name, field_shape) in fields {
                        let field = resolve(source.get(name)?, field_shape, entities)?;
                        out.insert(name.clone(), field);
                    }
                }
                None => {
                    for (name, child) in source {
                        out.insert(name.clone(), resolve(child, &Value::Null, entities)?);
                    }
                }
            }
            Some(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve(item, shape, entities))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        other => Some(other.clone()),
    }
}
