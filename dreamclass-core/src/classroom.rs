//! The classroom as one device sees it.
//!
//! `Classroom` ties the class data to local storage, the reconciler and the
//! push debouncer. Every change is tagged with where it came from: local
//! commands schedule a push, changes written by sync never do.

use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{CalendarEvent, ClassData, EventKind, Student};
use crate::share::{ShareCode, ShareCodeGenerator};
use crate::storage::{ClassStore, StorageError};
use crate::sync::{
    ChangeChannel, Connection, Debouncer, PushOutcome, Reconciliation, RemoteStore, RowStore,
    SyncError, SyncMode, SyncReconciler, SyncStamp,
};

#[derive(Error, Debug)]
pub enum ClassroomError {
    #[error("No student with id {0}")]
    StudentNotFound(Uuid),

    #[error("No event with id {0}")]
    EventNotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Where a change to the class data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A command on this device
    Local,
    /// A snapshot or bookkeeping written by the reconciler
    Sync,
}

/// Something the event loop is waiting for.
#[derive(Debug)]
pub enum ClassEvent {
    RemoteChange(ClassData),
    PushDue,
    /// The change channel ended; no more remote changes will arrive.
    ChannelClosed,
}

/// What handling a [`ClassEvent`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Reconciled(Reconciliation),
    Pushed(PushOutcome),
    ChannelClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub share_code: Option<ShareCode>,
    pub last_sync: Option<SyncStamp>,
    pub mode: SyncMode,
    pub listening: bool,
    pub push_pending: bool,
}

pub struct Classroom<B> {
    data: ClassData,
    store: ClassStore,
    reconciler: SyncReconciler<B>,
    debouncer: Debouncer,
}

impl<B: RowStore + ChangeChannel> Classroom<B> {
    /// Loads the class from `store`. Nothing is fetched or subscribed until
    /// [`resume`](Self::resume) or a connect call.
    pub fn open(
        store: ClassStore,
        remote: RemoteStore<B>,
        push_window: Duration,
    ) -> Result<Self, ClassroomError> {
        let data = store.load()?;
        debug!(
            "Loaded class with {} students and {} events",
            data.students.len(),
            data.events.len()
        );
        Ok(Self {
            data,
            store,
            reconciler: SyncReconciler::new(remote),
            debouncer: Debouncer::new(push_window),
        })
    }

    pub fn data(&self) -> &ClassData {
        &self.data
    }

    pub fn store(&self) -> &ClassStore {
        &self.store
    }

    pub fn sync_status(&self) -> SyncStatus {
        SyncStatus {
            share_code: self.data.share_code.clone(),
            last_sync: self.data.last_sync,
            mode: self.reconciler.mode(),
            listening: self.reconciler.is_listening(),
            push_pending: self.debouncer.is_armed(),
        }
    }

    // Commands

    pub fn add_student(
        &mut self,
        name: impl Into<String>,
        number: u32,
    ) -> Result<Student, ClassroomError> {
        let student = Student::new(name, number);
        self.data.students.push(student.clone());
        self.record(ChangeOrigin::Local)?;
        Ok(student)
    }

    /// Adds `delta` stickers (negative to take away); returns the new count.
    pub fn adjust_stickers(&mut self, id: Uuid, delta: i64) -> Result<u32, ClassroomError> {
        let student = self
            .data
            .student_mut(id)
            .ok_or(ClassroomError::StudentNotFound(id))?;
        let stickers = student.adjust_stickers(delta);
        self.record(ChangeOrigin::Local)?;
        Ok(stickers)
    }

    pub fn remove_student(&mut self, id: Uuid) -> Result<Student, ClassroomError> {
        let index = self
            .data
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or(ClassroomError::StudentNotFound(id))?;
        let student = self.data.students.remove(index);
        self.record(ChangeOrigin::Local)?;
        Ok(student)
    }

    pub fn add_event(
        &mut self,
        date: NaiveDate,
        title: impl Into<String>,
        kind: EventKind,
    ) -> Result<CalendarEvent, ClassroomError> {
        let event = CalendarEvent::new(date, title, kind);
        self.data.events.push(event.clone());
        self.record(ChangeOrigin::Local)?;
        Ok(event)
    }

    pub fn remove_event(&mut self, id: Uuid) -> Result<CalendarEvent, ClassroomError> {
        let index = self
            .data
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or(ClassroomError::EventNotFound(id))?;
        let event = self.data.events.remove(index);
        self.record(ChangeOrigin::Local)?;
        Ok(event)
    }

    // Sync

    pub async fn connect_new(
        &mut self,
        generator: &impl ShareCodeGenerator,
    ) -> Result<Connection, ClassroomError> {
        let connection = self.reconciler.connect_new(&mut self.data, generator).await?;
        // The connect push already carried any pending edits
        self.debouncer.cancel();
        self.record(ChangeOrigin::Sync)?;
        Ok(connection)
    }

    pub async fn connect_existing(&mut self, code: ShareCode) -> Result<Connection, ClassroomError> {
        let connection = self
            .reconciler
            .connect_existing(&mut self.data, code)
            .await?;
        self.debouncer.cancel();
        self.record(ChangeOrigin::Sync)?;
        Ok(connection)
    }

    pub fn disconnect(&mut self) -> Result<(), ClassroomError> {
        self.reconciler.disconnect(&mut self.data);
        if self.debouncer.cancel() {
            debug!("Dropped pending push on disconnect");
        }
        self.record(ChangeOrigin::Sync)
    }

    pub async fn refresh_now(&mut self) -> Result<Reconciliation, ClassroomError> {
        let outcome = self.reconciler.refresh_now(&mut self.data).await?;
        self.after_reconcile(outcome)?;
        Ok(outcome)
    }

    /// Restores the sync session at startup.
    ///
    /// A code from a share link that differs from the stored one joins that
    /// class. Otherwise a stored code is listened to again. Returns `None`
    /// when there is nothing to resume.
    pub async fn resume(
        &mut self,
        link_code: Option<ShareCode>,
    ) -> Result<Option<Connection>, ClassroomError> {
        if let Some(code) = link_code {
            if self.data.share_code.as_ref() != Some(&code) {
                info!("Opening class {} from share link", code);
                return self.connect_existing(code).await.map(Some);
            }
        }

        let Some(code) = self.data.share_code.clone() else {
            return Ok(None);
        };
        if self.reconciler.mode() == SyncMode::LocalOnly {
            return Ok(Some(Connection {
                code,
                mode: SyncMode::LocalOnly,
                listening: false,
            }));
        }

        let listening = self.reconciler.listen_or_warn(&code).await;
        Ok(Some(Connection {
            code,
            mode: SyncMode::Remote,
            listening,
        }))
    }

    /// Pushes immediately, dropping any pending debounce deadline.
    pub async fn push_now(&mut self) -> Result<PushOutcome, ClassroomError> {
        self.debouncer.cancel();
        let outcome = self.reconciler.push(&mut self.data).await?;
        if let PushOutcome::Pushed(_) = outcome {
            self.record(ChangeOrigin::Sync)?;
        }
        Ok(outcome)
    }

    pub fn on_remote_notification(
        &mut self,
        snapshot: ClassData,
    ) -> Result<Reconciliation, ClassroomError> {
        let outcome = self
            .reconciler
            .on_remote_notification(&mut self.data, snapshot);
        self.after_reconcile(outcome)?;
        Ok(outcome)
    }

    // Event loop

    /// Waits for the next remote change or push deadline.
    ///
    /// Never resolves when there is no subscription and no pending push.
    pub async fn next_event(&mut self) -> ClassEvent {
        let push_due = self.debouncer.elapsed();
        let subscription = self.reconciler.subscription_mut();

        tokio::select! {
            biased;
            update = next_update(subscription) => match update {
                Some(snapshot) => ClassEvent::RemoteChange(snapshot),
                None => ClassEvent::ChannelClosed,
            },
            _ = push_due => ClassEvent::PushDue,
        }
    }

    pub async fn handle(&mut self, event: ClassEvent) -> Result<EventOutcome, ClassroomError> {
        match event {
            ClassEvent::RemoteChange(snapshot) => self
                .on_remote_notification(snapshot)
                .map(EventOutcome::Reconciled),
            ClassEvent::PushDue => self.push_now().await.map(EventOutcome::Pushed),
            ClassEvent::ChannelClosed => {
                self.reconciler.stop_listening();
                Ok(EventOutcome::ChannelClosed)
            }
        }
    }

    /// Waits out a pending push window and pushes. `None` if nothing was
    /// pending.
    pub async fn settle(&mut self) -> Result<Option<PushOutcome>, ClassroomError> {
        if !self.debouncer.is_armed() {
            return Ok(None);
        }
        self.debouncer.elapsed().await;
        self.push_now().await.map(Some)
    }

    fn record(&mut self, origin: ChangeOrigin) -> Result<(), ClassroomError> {
        self.store.save(&self.data)?;
        if origin == ChangeOrigin::Local && self.should_push() {
            self.debouncer.arm();
        }
        Ok(())
    }

    fn should_push(&self) -> bool {
        self.data.share_code.is_some() && self.reconciler.mode() == SyncMode::Remote
    }

    fn after_reconcile(&mut self, outcome: Reconciliation) -> Result<(), ClassroomError> {
        if let Reconciliation::Applied(stamp) = outcome {
            // The snapshot superseded whatever edits the pending push held
            if self.debouncer.cancel() {
                debug!("Dropped pending push superseded by snapshot {}", stamp);
            }
            info!("Applied remote snapshot stamped {}", stamp);
            self.record(ChangeOrigin::Sync)?;
        }
        Ok(())
    }
}

async fn next_update(subscription: Option<&mut crate::sync::Subscription>) -> Option<ClassData> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}
