//! Dreamclass Core Library
//!
//! Classroom data, local persistence and last-write-wins sync between
//! devices sharing a class code.

pub mod assistant;
pub mod classroom;
pub mod models;
pub mod share;
pub mod storage;
pub mod sync;

pub use assistant::{Assistant, AssistantError, GeminiClient, TextGenerator};
pub use classroom::{
    ChangeOrigin, ClassEvent, Classroom, ClassroomError, EventOutcome, SyncStatus,
};
pub use models::{CalendarEvent, ClassData, ClassNote, EventKind, Student};
pub use share::{
    code_from_link, share_link, ShareCode, ShareCodeError, ShareCodeGenerator, WordCodeGenerator,
};
pub use storage::{ClassStore, FileStore, LocalStore, MemoryStore, StorageError};
pub use sync::{
    ChangeChannel, Connection, MemoryBackend, PushOutcome, Reconciliation, RemoteSettings,
    RemoteStore, RowStore, SkipReason, SupabaseBackend, SyncError, SyncMode, SyncStamp,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
