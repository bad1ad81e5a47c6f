use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Holiday,
    Event,
    Exam,
    Other,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Holiday => write!(f, "holiday"),
            EventKind::Event => write!(f, "event"),
            EventKind::Exam => write!(f, "exam"),
            EventKind::Other => write!(f, "other"),
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "holiday" => Ok(EventKind::Holiday),
            "event" => Ok(EventKind::Event),
            "exam" => Ok(EventKind::Exam),
            "other" => Ok(EventKind::Other),
            _ => Err(format!(
                "Invalid event type '{}'. Valid options: holiday, event, exam, other",
                s
            )),
        }
    }
}
