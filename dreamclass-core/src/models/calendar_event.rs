use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::event_kind::EventKind;

/// An entry on the school calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub date: NaiveDate,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl CalendarEvent {
    pub fn new(date: NaiveDate, title: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            title: title.into(),
            kind,
        }
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {} [{}]", self.date, self.title, self.kind)
    }
}
