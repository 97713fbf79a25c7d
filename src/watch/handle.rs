// src/watch/handle.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Lifecycle of a watched path as observed from outside the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Running the baseline scan.
    Initializing,
    /// Waiting for or running poll ticks.
    Polling,
    /// The previous unit exited abnormally; a replacement is being started.
    Restarting,
    /// Stopped, shut down, or given up on. Terminal.
    Terminated,
}

/// Cheap, clonable handle to a supervised watcher.
///
/// The handle survives restarts: the supervisor swaps the unit underneath,
/// but the path, stop signal and state channel stay the same.
#[derive(Clone)]
pub struct WatcherHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    path: PathBuf,
    interval: Duration,
    stop_tx: watch::Sender<bool>,
    state_tx: watch::Sender<UnitState>,
    restarts: AtomicU32,
}

impl fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("path", &self.inner.path)
            .field("interval", &self.inner.interval)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl WatcherHandle {
    pub(crate) fn new(path: PathBuf, interval: Duration) -> Self {
        let (stop_tx, _) = watch::channel(false);
        let (state_tx, _) = watch::channel(UnitState::Initializing);
        Self {
            inner: Arc::new(HandleInner {
                path,
                interval,
                stop_tx,
                state_tx,
                restarts: AtomicU32::new(0),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    pub fn state(&self) -> UnitState {
        *self.inner.state_tx.borrow()
    }

    /// Number of times the supervisor replaced a crashed unit.
    pub fn restarts(&self) -> u32 {
        self.inner.restarts.load(Ordering::Relaxed)
    }

    /// True if both handles refer to the same supervised watcher.
    pub fn same_watcher(&self, other: &WatcherHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Ask the unit to stop after its current tick. Idempotent.
    pub fn request_stop(&self) {
        self.inner.stop_tx.send_replace(true);
    }

    pub fn stop_requested(&self) -> bool {
        *self.inner.stop_tx.borrow()
    }

    /// Resolve once the watcher reaches [`UnitState::Terminated`].
    pub async fn terminated(&self) {
        let mut rx = self.inner.state_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|s| *s == UnitState::Terminated).await;
    }

    pub(crate) fn stop_signal(&self) -> watch::Receiver<bool> {
        self.inner.stop_tx.subscribe()
    }

    pub(crate) fn set_state(&self, state: UnitState) {
        self.inner.state_tx.send_replace(state);
    }

    pub(crate) fn record_restart(&self) -> u32 {
        self.inner.restarts.fetch_add(1, Ordering::Relaxed) + 1
    }
}
