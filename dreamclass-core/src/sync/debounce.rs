//! Push debouncing.

use std::future::{self, Future};
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// A single resettable deadline.
///
/// Arming while already armed moves the deadline, so a burst of edits
/// produces one push `window` after the last of them.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1500);

    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Starts or restarts the countdown.
    pub fn arm(&mut self) {
        if self.deadline.is_some() {
            debug!("Push deadline reset");
        }
        self.deadline = Some(Instant::now() + self.window);
    }

    /// Disarms; returns whether a push was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves at the current deadline, or never if disarmed.
    ///
    /// The future does not borrow `self`; re-arming afterwards does not move
    /// a deadline already being waited on.
    pub fn elapsed(&self) -> impl Future<Output = ()> + 'static {
        let deadline = self.deadline;
        async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => future::pending().await,
            }
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[test]
    fn test_new_is_disarmed() {
        let debouncer = Debouncer::default();
        assert!(!debouncer.is_armed());
        assert_eq!(debouncer.window(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_waits_for_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(1500));
        debouncer.arm();

        debouncer.elapsed().await;
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_moves_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(1500));
        debouncer.arm();

        advance(Duration::from_millis(1000)).await;
        debouncer.arm();

        debouncer.elapsed().await;
        assert_eq!(start.elapsed(), Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_disarms() {
        let mut debouncer = Debouncer::default();
        assert!(!debouncer.cancel());

        debouncer.arm();
        assert!(debouncer.cancel());
        assert!(!debouncer.is_armed());

        let waited =
            tokio::time::timeout(Duration::from_secs(60), debouncer.elapsed()).await;
        assert!(waited.is_err());
    }
}
