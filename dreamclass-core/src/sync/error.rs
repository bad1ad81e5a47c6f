//! Sync error types.

use thiserror::Error;

use crate::share::ShareCode;

/// Errors that can occur talking to the remote store or change channel.
///
/// A snapshot that is not newer than local state is not an error; see
/// [`Reconciliation::StaleIgnored`](super::Reconciliation::StaleIgnored).
#[derive(Error, Debug)]
pub enum SyncError {
    /// No remote credentials are configured
    #[error("Remote store not configured. Add a remote URL and key to enable sync.")]
    NotConfigured,

    /// The share code has no row in the remote store
    #[error("No class found for share code '{0}'")]
    NotFound(ShareCode),

    /// Network failure reaching the remote store
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),

    /// The remote store answered with an error status
    #[error("Remote store returned status {status}: {message}")]
    Service { status: u16, message: String },

    /// The remote store returned data we could not read
    #[error("Failed to decode remote data: {0}")]
    Decode(String),

    /// Change channel protocol failure
    #[error("Change channel error: {0}")]
    Channel(String),

    /// The change channel did not confirm the subscription in time
    #[error("Change channel join timed out")]
    JoinTimeout,
}
