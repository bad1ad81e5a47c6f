//! Local persistence for class data and connection settings.

mod class_store;
mod local_store;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use class_store::ClassStore;
pub use local_store::{FileStore, LocalStore, MemoryStore};

/// Errors that can occur during local storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error for {}: {1}", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Stored value for '{key}' is unreadable: {message}")]
    Corrupt { key: String, message: String },
}
