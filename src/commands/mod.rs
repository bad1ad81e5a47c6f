mod ask;
mod config_cmd;
pub mod dashboard;
mod event;
mod student;
mod sync_cmd;

use clap::ValueEnum;
use std::io::{self, Write};

use dreamclass_core::ClassroomError;

pub use ask::{greet, AskCommand};
pub use config_cmd::ConfigCommand;
pub use event::EventCommand;
pub use student::StudentCommand;
pub use sync_cmd::SyncCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Errors from class commands
#[derive(Debug)]
pub enum CommandError {
    StudentNotFound(String),
    EventNotFound(String),
    InvalidDate(String),
    InvalidMonth(String),
    InvalidKind(String),
    InvalidCode(String),
    Classroom(ClassroomError),
    Json(serde_json::Error),
    Io(io::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::StudentNotFound(s) => write!(f, "Student not found: {}", s),
            CommandError::EventNotFound(s) => write!(f, "Event not found: {}", s),
            CommandError::InvalidDate(s) => {
                write!(f, "Invalid date format '{}'. Use YYYY-MM-DD.", s)
            }
            CommandError::InvalidMonth(s) => {
                write!(f, "Invalid month format '{}'. Use YYYY-MM.", s)
            }
            CommandError::InvalidKind(e) => write!(f, "{}", e),
            CommandError::InvalidCode(s) => write!(f, "Not a class code or share link: '{}'", s),
            CommandError::Classroom(e) => write!(f, "{}", e),
            CommandError::Json(e) => write!(f, "JSON error: {}", e),
            CommandError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Classroom(e) => Some(e),
            CommandError::Json(e) => Some(e),
            CommandError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ClassroomError> for CommandError {
    fn from(e: ClassroomError) -> Self {
        CommandError::Classroom(e)
    }
}

impl From<dreamclass_core::StorageError> for CommandError {
    fn from(e: dreamclass_core::StorageError) -> Self {
        CommandError::Classroom(ClassroomError::Storage(e))
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        CommandError::Json(e)
    }
}

impl From<io::Error> for CommandError {
    fn from(e: io::Error) -> Self {
        CommandError::Io(e)
    }
}

/// Asks a yes/no question on stdin; anything but "y" is no.
pub(crate) fn confirm(prompt: &str) -> Result<bool, CommandError> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
