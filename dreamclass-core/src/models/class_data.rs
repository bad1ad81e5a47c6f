use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar_event::CalendarEvent;
use super::class_note::ClassNote;
use super::student::Student;
use crate::share::ShareCode;
use crate::sync::SyncStamp;

/// Everything that makes up one classroom.
///
/// This is the unit written to local storage and exchanged with the remote
/// store. Snapshots replace it wholesale; fields are never merged one by one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassData {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    #[serde(default)]
    pub notes: Vec<ClassNote>,
    #[serde(
        default,
        deserialize_with = "crate::sync::timestamp::optional::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_sync: Option<SyncStamp>,
    #[serde(default, alias = "cloudId", skip_serializing_if = "Option::is_none")]
    pub share_code: Option<ShareCode>,
}

impl ClassData {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of this data tagged with `stamp`, ready to be sent.
    pub fn stamped(&self, stamp: SyncStamp) -> Self {
        Self {
            last_sync: Some(stamp),
            ..self.clone()
        }
    }

    /// Replaces the class contents with `snapshot`'s and adopts its stamp.
    ///
    /// The share code is left alone: it belongs to this device's session,
    /// not to the snapshot.
    pub fn replace_with(&mut self, snapshot: ClassData) {
        self.students = snapshot.students;
        self.events = snapshot.events;
        self.notes = snapshot.notes;
        self.last_sync = snapshot.last_sync;
    }

    /// True when the class contents (not the sync metadata) are equal.
    pub fn same_contents(&self, other: &ClassData) -> bool {
        self.students == other.students && self.events == other.events && self.notes == other.notes
    }

    pub fn student(&self, id: uuid::Uuid) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn student_mut(&mut self, id: uuid::Uuid) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.id == id)
    }

    pub fn student_by_number(&self, number: u32) -> Option<&Student> {
        self.students.iter().find(|s| s.number == number)
    }

    /// The student with the most stickers; the last listed wins ties.
    pub fn top_student(&self) -> Option<&Student> {
        self.students
            .iter()
            .fold(None, |best: Option<&Student>, s| match best {
                Some(b) if b.stickers > s.stickers => Some(b),
                _ => Some(s),
            })
    }

    /// Events in the given month, ordered by date.
    pub fn events_in_month(&self, year: i32, month: u32) -> Vec<&CalendarEvent> {
        let mut events: Vec<&CalendarEvent> = self
            .events
            .iter()
            .filter(|e| e.date.year() == year && e.date.month() == month)
            .collect();
        events.sort_by_key(|e| e.date);
        events
    }

    /// Up to `limit` events on or after `from`, ordered by date.
    pub fn upcoming_events(&self, from: NaiveDate, limit: usize) -> Vec<&CalendarEvent> {
        let mut events: Vec<&CalendarEvent> =
            self.events.iter().filter(|e| e.date >= from).collect();
        events.sort_by_key(|e| e.date);
        events.truncate(limit);
        events
    }
}
