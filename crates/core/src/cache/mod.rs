//! In-memory normalized cache
//!
//! Objects carrying `__typename` and an id are stored once as entities and
//! referenced from query results, so the same entity fetched by two
//! queries is deduplicated and updates are visible through both.

pub mod normalized;
pub mod possible_types;

pub use normalized::InMemoryCache;
pub use possible_types::PossibleTypes;
