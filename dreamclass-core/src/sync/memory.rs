//! In-process remote store.
//!
//! Clones share one table, so several `Classroom`s holding clones behave
//! like devices talking to the same hosted store. Every upsert is echoed to
//! all subscribers of that code, the writer included.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::error::SyncError;
use super::remote::{ChangeChannel, RowStore, Subscription};
use crate::models::ClassData;
use crate::share::ShareCode;

#[derive(Debug, Default)]
struct Table {
    rows: HashMap<ShareCode, ClassData>,
    subscribers: HashMap<ShareCode, Vec<mpsc::UnboundedSender<ClassData>>>,
    offline: bool,
    upserts: usize,
}

/// A shared in-memory row table with a change hub.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    table: Arc<Mutex<Table>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes every call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.table().offline = offline;
    }

    /// Total successful upserts so far.
    pub fn upsert_count(&self) -> usize {
        self.table().upserts
    }

    pub fn row(&self, code: &ShareCode) -> Option<ClassData> {
        self.table().rows.get(code).cloned()
    }

    /// Number of live subscriptions for `code`.
    pub fn subscriber_count(&self, code: &ShareCode) -> usize {
        let mut table = self.table();
        match table.subscribers.get_mut(code) {
            Some(senders) => {
                senders.retain(|s| !s.is_closed());
                senders.len()
            }
            None => 0,
        }
    }

    fn ensure_online(table: &Table) -> Result<(), SyncError> {
        if table.offline {
            return Err(SyncError::Unreachable("memory backend is offline".to_string()));
        }
        Ok(())
    }
}

impl RowStore for MemoryBackend {
    async fn upsert(&self, code: &ShareCode, data: &ClassData) -> Result<(), SyncError> {
        let mut table = self.table();
        Self::ensure_online(&table)?;

        table.rows.insert(code.clone(), data.clone());
        table.upserts += 1;

        if let Some(senders) = table.subscribers.get_mut(code) {
            // Closed receivers belong to dropped subscriptions
            senders.retain(|s| s.send(data.clone()).is_ok());
        }
        Ok(())
    }

    async fn fetch(&self, code: &ShareCode) -> Result<Option<ClassData>, SyncError> {
        let table = self.table();
        Self::ensure_online(&table)?;
        Ok(table.rows.get(code).cloned())
    }
}

impl ChangeChannel for MemoryBackend {
    async fn subscribe(&self, code: &ShareCode) -> Result<Subscription, SyncError> {
        let mut table = self.table();
        Self::ensure_online(&table)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        table
            .subscribers
            .entry(code.clone())
            .or_default()
            .push(sender);
        Ok(Subscription::new(code.clone(), receiver, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Student;

    fn code(raw: &str) -> ShareCode {
        ShareCode::parse(raw).unwrap()
    }

    fn class_with(name: &str) -> ClassData {
        let mut data = ClassData::new();
        data.students.push(Student::new(name, 1));
        data
    }

    #[tokio::test]
    async fn test_upsert_and_fetch() {
        let backend = MemoryBackend::new();
        assert!(backend.fetch(&code("a-1000")).await.unwrap().is_none());

        backend.upsert(&code("a-1000"), &class_with("Hana")).await.unwrap();
        let fetched = backend.fetch(&code("a-1000")).await.unwrap().unwrap();
        assert_eq!(fetched.students[0].name, "Hana");
        assert_eq!(backend.upsert_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_receive_upserts_for_their_code() {
        let backend = MemoryBackend::new();
        let mut sub_a = backend.subscribe(&code("a-1000")).await.unwrap();
        let mut sub_b = backend.subscribe(&code("b-2000")).await.unwrap();

        backend.upsert(&code("a-1000"), &class_with("Hana")).await.unwrap();

        assert_eq!(sub_a.try_recv().unwrap().students[0].name, "Hana");
        assert!(sub_b.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let device_a = MemoryBackend::new();
        let device_b = device_a.clone();
        let mut sub = device_b.subscribe(&code("a-1000")).await.unwrap();

        device_a.upsert(&code("a-1000"), &class_with("Hana")).await.unwrap();
        assert!(sub.try_recv().is_some());
        assert!(device_b.row(&code("a-1000")).is_some());
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let backend = MemoryBackend::new();
        let sub = backend.subscribe(&code("a-1000")).await.unwrap();
        assert_eq!(backend.subscriber_count(&code("a-1000")), 1);

        drop(sub);
        assert_eq!(backend.subscriber_count(&code("a-1000")), 0);
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let backend = MemoryBackend::new();
        backend.set_offline(true);

        assert!(matches!(
            backend.upsert(&code("a-1000"), &ClassData::new()).await,
            Err(SyncError::Unreachable(_))
        ));
        assert!(backend.fetch(&code("a-1000")).await.is_err());
        assert!(backend.subscribe(&code("a-1000")).await.is_err());
        assert_eq!(backend.upsert_count(), 0);
    }
}
