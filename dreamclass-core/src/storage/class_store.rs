//! Key layout for class data inside a [`LocalStore`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{LocalStore, StorageError};
use crate::models::ClassData;
use crate::share::ShareCode;
use crate::sync::{RemoteSettings, SyncStamp};

const KEY_STUDENTS: &str = "students";
const KEY_EVENTS: &str = "events";
const KEY_NOTES: &str = "notes";
const KEY_SHARE_CODE: &str = "share_code";
const KEY_LAST_SYNC: &str = "last_sync";
const KEY_REMOTE_URL: &str = "remote_url";
const KEY_REMOTE_KEY: &str = "remote_key";

/// Reads and writes [`ClassData`] and remote credentials, one blob per key.
pub struct ClassStore {
    store: Box<dyn LocalStore>,
}

impl ClassStore {
    pub fn new(store: impl LocalStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Loads the class, using empty defaults for anything never saved.
    pub fn load(&self) -> Result<ClassData, StorageError> {
        let last_sync = match self.read_text(KEY_LAST_SYNC)? {
            Some(raw) => Some(raw.parse::<SyncStamp>().map_err(|e| corrupt(KEY_LAST_SYNC, e))?),
            None => None,
        };
        let share_code = match self.read_text(KEY_SHARE_CODE)? {
            Some(raw) => Some(ShareCode::parse(&raw).map_err(|e| corrupt(KEY_SHARE_CODE, e))?),
            None => None,
        };

        Ok(ClassData {
            students: self.read_json(KEY_STUDENTS)?.unwrap_or_default(),
            events: self.read_json(KEY_EVENTS)?.unwrap_or_default(),
            notes: self.read_json(KEY_NOTES)?.unwrap_or_default(),
            last_sync,
            share_code,
        })
    }

    pub fn save(&self, data: &ClassData) -> Result<(), StorageError> {
        self.write_json(KEY_STUDENTS, &data.students)?;
        self.write_json(KEY_EVENTS, &data.events)?;
        self.write_json(KEY_NOTES, &data.notes)?;

        match &data.share_code {
            Some(code) => self.store.set(KEY_SHARE_CODE, code.as_str())?,
            None => self.store.remove(KEY_SHARE_CODE)?,
        }
        match &data.last_sync {
            Some(stamp) => self.store.set(KEY_LAST_SYNC, &stamp.to_string())?,
            None => self.store.remove(KEY_LAST_SYNC)?,
        }
        Ok(())
    }

    /// Remote credentials saved on this device, if both parts are present.
    pub fn remote_settings(&self) -> Result<Option<RemoteSettings>, StorageError> {
        let url = self.read_text(KEY_REMOTE_URL)?;
        let key = self.read_text(KEY_REMOTE_KEY)?;
        Ok(match (url, key) {
            (Some(url), Some(key)) => Some(RemoteSettings { url, key }),
            _ => None,
        })
    }

    pub fn save_remote_settings(&self, settings: &RemoteSettings) -> Result<(), StorageError> {
        self.store.set(KEY_REMOTE_URL, &settings.url)?;
        self.store.set(KEY_REMOTE_KEY, &settings.key)
    }

    pub fn clear_remote_settings(&self) -> Result<(), StorageError> {
        self.store.remove(KEY_REMOTE_URL)?;
        self.store.remove(KEY_REMOTE_KEY)
    }

    /// Reads a value, treating a blank one as absent.
    fn read_text(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .store
            .get(key)?
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty()))
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.read_text(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| corrupt(key, e)),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|e| corrupt(key, e))?;
        self.store.set(key, &json)
    }
}

fn corrupt(key: &str, err: impl std::fmt::Display) -> StorageError {
    StorageError::Corrupt {
        key: key.to_string(),
        message: err.to_string(),
    }
}
