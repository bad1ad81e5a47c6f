use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A free-text note about the class.
///
/// Stored and synced with the rest of the class data; nothing in the core
/// reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassNote {
    pub id: Uuid,
    pub date: String,
    pub content: String,
}
