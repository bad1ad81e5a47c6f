//! Last-write-wins reconciliation between local class data and the remote row.
//!
//! Every write to the remote store carries a fresh [`SyncStamp`] and the
//! same stamp is recorded locally. Incoming snapshots are applied only when
//! their stamp is strictly newer than the local one, which also drops the
//! echo of our own writes.

use tracing::{debug, info, warn};

use super::error::SyncError;
use super::remote::{ChangeChannel, RemoteStore, RowStore, Subscription};
use super::timestamp::SyncStamp;
use crate::models::ClassData;
use crate::share::{ShareCode, ShareCodeGenerator};

/// Why a sync operation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The class is not shared
    NoShareCode,
    /// No remote store on this device
    Unconfigured,
}

/// Result of offering a snapshot to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Local state replaced; carries the adopted stamp.
    Applied(SyncStamp),
    /// Snapshot not newer than local state, or unstamped.
    StaleIgnored,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed(SyncStamp),
    Skipped(SkipReason),
}

/// How a share code is being synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Backed by the remote store
    Remote,
    /// Code kept on this device only; nothing is sent anywhere
    LocalOnly,
}

/// A share code the class is now bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub code: ShareCode,
    pub mode: SyncMode,
    /// False when the change channel could not be opened. Pushes and manual
    /// refreshes still work.
    pub listening: bool,
}

/// Keeps one device's [`ClassData`] in step with the remote row.
///
/// The reconciler owns the remote store and the change subscription; the
/// class data itself is passed in by the caller.
pub struct SyncReconciler<B> {
    remote: RemoteStore<B>,
    subscription: Option<Subscription>,
}

impl<B: RowStore + ChangeChannel> SyncReconciler<B> {
    pub fn new(remote: RemoteStore<B>) -> Self {
        Self {
            remote,
            subscription: None,
        }
    }

    pub fn remote(&self) -> &RemoteStore<B> {
        &self.remote
    }

    pub fn mode(&self) -> SyncMode {
        if self.remote.is_connected() {
            SyncMode::Remote
        } else {
            SyncMode::LocalOnly
        }
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn subscription_mut(&mut self) -> Option<&mut Subscription> {
        self.subscription.as_mut()
    }

    pub fn stop_listening(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!("Stopped listening for class {}", subscription.code());
        }
    }

    /// Shares the class under a newly generated code.
    ///
    /// The current data is written to the remote store before the code is
    /// adopted, so a failed write leaves the class unshared. Without a
    /// remote store the code is adopted locally and nothing is sent.
    pub async fn connect_new(
        &mut self,
        data: &mut ClassData,
        generator: &impl ShareCodeGenerator,
    ) -> Result<Connection, SyncError> {
        let code = generator.generate();
        self.stop_listening();

        let RemoteStore::Connected(backend) = &self.remote else {
            info!("No remote store configured; code {} kept on this device", code);
            data.share_code = Some(code.clone());
            return Ok(Connection {
                code,
                mode: SyncMode::LocalOnly,
                listening: false,
            });
        };

        let stamp = SyncStamp::next_after(data.last_sync);
        let mut snapshot = data.stamped(stamp);
        snapshot.share_code = Some(code.clone());
        backend.upsert(&code, &snapshot).await?;

        data.share_code = Some(code.clone());
        data.last_sync = Some(stamp);
        info!("Shared class as {}", code);

        let listening = self.listen_or_warn(&code).await;
        Ok(Connection {
            code,
            mode: SyncMode::Remote,
            listening,
        })
    }

    /// Joins the class stored under `code`, replacing local contents.
    ///
    /// The remote stamp is adopted even if older than the local one: joining
    /// starts a new session.
    pub async fn connect_existing(
        &mut self,
        data: &mut ClassData,
        code: ShareCode,
    ) -> Result<Connection, SyncError> {
        let snapshot = match &self.remote {
            RemoteStore::Connected(backend) => backend.fetch(&code).await?,
            RemoteStore::Unconfigured => return Err(SyncError::NotConfigured),
        }
        .ok_or_else(|| SyncError::NotFound(code.clone()))?;

        self.stop_listening();
        data.replace_with(snapshot);
        data.share_code = Some(code.clone());
        info!("Joined class {}", code);

        let listening = self.listen_or_warn(&code).await;
        Ok(Connection {
            code,
            mode: SyncMode::Remote,
            listening,
        })
    }

    /// Stops sharing. Local contents and the last stamp are kept.
    pub fn disconnect(&mut self, data: &mut ClassData) {
        self.stop_listening();
        if let Some(code) = data.share_code.take() {
            info!("Stopped sharing class {}", code);
        }
    }

    /// Writes the current data to the remote row under a fresh stamp.
    ///
    /// The local stamp only advances once the write has succeeded.
    pub async fn push(&self, data: &mut ClassData) -> Result<PushOutcome, SyncError> {
        let Some(code) = data.share_code.clone() else {
            return Ok(PushOutcome::Skipped(SkipReason::NoShareCode));
        };
        let RemoteStore::Connected(backend) = &self.remote else {
            return Ok(PushOutcome::Skipped(SkipReason::Unconfigured));
        };

        let stamp = SyncStamp::next_after(data.last_sync);
        match backend.upsert(&code, &data.stamped(stamp)).await {
            Ok(()) => {
                data.last_sync = Some(stamp);
                debug!("Pushed class {} at {}", code, stamp);
                Ok(PushOutcome::Pushed(stamp))
            }
            Err(e) => {
                warn!("Push of class {} failed: {}", code, e);
                Err(e)
            }
        }
    }

    /// Offers a snapshot received from the change channel.
    pub fn on_remote_notification(
        &self,
        data: &mut ClassData,
        snapshot: ClassData,
    ) -> Reconciliation {
        if data.share_code.is_none() {
            return Reconciliation::Skipped(SkipReason::NoShareCode);
        }
        apply_if_newer(data, snapshot)
    }

    /// Fetches the remote row and applies it if newer.
    pub async fn refresh_now(&self, data: &mut ClassData) -> Result<Reconciliation, SyncError> {
        let Some(code) = data.share_code.clone() else {
            return Ok(Reconciliation::Skipped(SkipReason::NoShareCode));
        };
        let RemoteStore::Connected(backend) = &self.remote else {
            return Ok(Reconciliation::Skipped(SkipReason::Unconfigured));
        };

        let snapshot = backend
            .fetch(&code)
            .await?
            .ok_or(SyncError::NotFound(code))?;
        Ok(apply_if_newer(data, snapshot))
    }

    /// Opens the change channel for `code`, replacing any previous one.
    pub async fn listen(&mut self, code: &ShareCode) -> Result<(), SyncError> {
        self.stop_listening();
        let RemoteStore::Connected(backend) = &self.remote else {
            return Err(SyncError::NotConfigured);
        };
        self.subscription = Some(backend.subscribe(code).await?);
        Ok(())
    }

    pub(crate) async fn listen_or_warn(&mut self, code: &ShareCode) -> bool {
        match self.listen(code).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not listen for changes to class {}: {}", code, e);
                false
            }
        }
    }
}

fn apply_if_newer(data: &mut ClassData, snapshot: ClassData) -> Reconciliation {
    match snapshot.last_sync {
        Some(incoming) if data.last_sync.map_or(true, |current| incoming > current) => {
            data.replace_with(snapshot);
            debug!("Applied snapshot stamped {}", incoming);
            Reconciliation::Applied(incoming)
        }
        incoming => {
            debug!(
                "Ignored snapshot stamped {:?}; local stamp is {:?}",
                incoming.map(|s| s.to_string()),
                data.last_sync.map(|s| s.to_string())
            );
            Reconciliation::StaleIgnored
        }
    }
}
