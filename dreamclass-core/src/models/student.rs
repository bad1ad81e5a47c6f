use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A student on the class roll and their merit sticker count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    /// Roll number within the class
    pub number: u32,
    #[serde(default)]
    pub stickers: u32,
}

impl Student {
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            number,
            stickers: 0,
        }
    }

    /// Adds `delta` stickers (negative removes), clamped to `0..=u32::MAX`.
    ///
    /// Returns the new count.
    pub fn adjust_stickers(&mut self, delta: i64) -> u32 {
        let next = (self.stickers as i64).saturating_add(delta);
        self.stickers = next.clamp(0, u32::MAX as i64) as u32;
        self.stickers
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3}. {} ({} sticker{})",
            self.number,
            self.name,
            self.stickers,
            if self.stickers == 1 { "" } else { "s" }
        )
    }
}
