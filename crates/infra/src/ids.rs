//! Identifier generation

use gqlink_core::IdGenerator;
use uuid::Uuid;

/// [`IdGenerator`] producing random (v4) UUID strings
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
