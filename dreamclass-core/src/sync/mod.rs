//! Multi-device synchronization.
//!
//! One remote row per share code holds the whole class. Devices push full
//! snapshots and listen for each other's; conflicts resolve by last write.

mod debounce;
mod error;
mod memory;
mod protocol;
mod realtime;
mod reconciler;
mod remote;
mod supabase;
pub(crate) mod timestamp;

pub use debounce::Debouncer;
pub use error::SyncError;
pub use memory::MemoryBackend;
pub use protocol::{PhoenixMessage, TABLE};
pub use reconciler::{
    Connection, PushOutcome, Reconciliation, SkipReason, SyncMode, SyncReconciler,
};
pub use remote::{ChangeChannel, RemoteSettings, RemoteStore, RowStore, Subscription};
pub use supabase::SupabaseBackend;
pub use timestamp::SyncStamp;
