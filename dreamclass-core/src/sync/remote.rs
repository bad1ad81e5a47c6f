//! Remote store interfaces.
//!
//! A remote store is a table with one row per share code. It is optional:
//! [`RemoteStore::Unconfigured`] stands for "no credentials on this device"
//! and every sync operation checks for it explicitly.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::error::SyncError;
use crate::models::ClassData;
use crate::share::ShareCode;

/// Address and key for a hosted remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub url: String,
    pub key: String,
}

/// Row storage keyed by share code.
pub trait RowStore {
    /// Inserts or replaces the row for `code`.
    fn upsert(
        &self,
        code: &ShareCode,
        data: &ClassData,
    ) -> impl Future<Output = Result<(), SyncError>>;

    /// Fetches the row for `code`; `Ok(None)` when there is none.
    fn fetch(&self, code: &ShareCode)
        -> impl Future<Output = Result<Option<ClassData>, SyncError>>;
}

/// Push notifications for inserts and updates of one row.
pub trait ChangeChannel {
    fn subscribe(&self, code: &ShareCode)
        -> impl Future<Output = Result<Subscription, SyncError>>;
}

/// The remote store as seen by the reconciler.
#[derive(Debug, Clone)]
pub enum RemoteStore<B> {
    Unconfigured,
    Connected(B),
}

impl<B> RemoteStore<B> {
    pub fn is_connected(&self) -> bool {
        matches!(self, RemoteStore::Connected(_))
    }
}

/// An active change subscription for one share code.
///
/// Dropping it stops the underlying listener.
#[derive(Debug)]
pub struct Subscription {
    code: ShareCode,
    updates: mpsc::UnboundedReceiver<ClassData>,
    listener: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wraps a stream of snapshots, optionally owning the task producing them.
    pub fn new(
        code: ShareCode,
        updates: mpsc::UnboundedReceiver<ClassData>,
        listener: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            code,
            updates,
            listener,
        }
    }

    pub fn code(&self) -> &ShareCode {
        &self.code
    }

    /// Waits for the next snapshot. `None` once the channel has closed.
    pub async fn recv(&mut self) -> Option<ClassData> {
        self.updates.recv().await
    }

    /// Returns a snapshot if one is already queued.
    pub fn try_recv(&mut self) -> Option<ClassData> {
        self.updates.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
