// src/watch/supervisor.rs

use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::bus::EventBus;
use crate::discovery::Discovery;
use crate::errors::{Result, WatchError};
use crate::fs::FileSystem;
use crate::types::{RestartPolicy, WatchOptions};
use crate::watch::handle::{UnitState, WatcherHandle};
use crate::watch::registry::Registry;
use crate::watch::unit::{StartMode, UnitContext, WatcherUnit};

/// Starts, stops and restarts watcher units.
///
/// Each watched path gets a monitor task that runs the unit and applies the
/// transient restart policy: a unit that returns after a stop request is
/// done, a unit that errors or panics is replaced by a fresh one with an
/// empty snapshot.
#[derive(Debug, Clone)]
pub struct Supervisor {
    registry: Arc<Registry>,
    ctx: UnitContext,
    policy: RestartPolicy,
}

impl Supervisor {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        discovery: Arc<dyn Discovery>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            ctx: UnitContext { fs, discovery, bus },
            policy: RestartPolicy::default(),
        }
    }

    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Begin watching `path`.
    ///
    /// The path is made absolute and cleaned lexically (see [`watch_key`]);
    /// it does not have to exist, and a missing root simply yields empty
    /// scans. Fails with [`WatchError::AlreadyWatching`] if the path is
    /// already supervised.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_watching(&self, path: impl AsRef<Path>, options: WatchOptions) -> Result<WatcherHandle> {
        if options.interval.is_zero() {
            return Err(WatchError::ConfigError(
                "watch interval must be greater than zero".to_string(),
            ));
        }

        let path = watch_key(path.as_ref());
        let handle = WatcherHandle::new(path.clone(), options.interval);
        self.registry.register(&path, handle.clone())?;

        info!(
            path = %path.display(),
            interval_ms = options.interval.as_millis() as u64,
            "watching"
        );

        tokio::spawn(supervise(
            handle.clone(),
            options,
            self.ctx.clone(),
            Arc::clone(&self.registry),
            self.policy,
        ));

        Ok(handle)
    }

    /// Stop watching `path` and wait for its unit to terminate.
    ///
    /// A tick already in progress runs to completion first. Fails with
    /// [`WatchError::NotFound`] (and changes nothing) if the path is not
    /// watched.
    pub async fn stop_watching(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = watch_key(path.as_ref());
        let handle = self
            .registry
            .lookup(&path)
            .ok_or_else(|| WatchError::NotFound(path.clone()))?;

        handle.request_stop();
        handle.terminated().await;
        // The monitor unregisters on exit; this covers a monitor that never ran.
        self.registry.unregister_handle(&handle);

        info!(path = %path.display(), "stopped watching");
        Ok(())
    }

    /// Paths currently under supervision, sorted.
    pub fn list_watched(&self) -> Vec<PathBuf> {
        self.registry.list()
    }

    pub fn lookup(&self, path: impl AsRef<Path>) -> Option<WatcherHandle> {
        self.registry.lookup(&watch_key(path.as_ref()))
    }

    /// Stop every watcher and wait for all of them to terminate.
    pub async fn shutdown(&self) {
        let handles = self.registry.handles();
        info!(count = handles.len(), "shutting down watchers");

        for handle in &handles {
            handle.request_stop();
        }
        for handle in &handles {
            handle.terminated().await;
            self.registry.unregister_handle(handle);
        }
    }
}

/// Registry key for a watched path.
///
/// Relative paths are joined onto the current directory, then `.` and `..`
/// components are resolved lexically. Symlinks are left alone, so the key
/// does not change when the path (or a link on the way to it) appears or
/// disappears after watching starts.
pub fn watch_key(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut key = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                key.pop();
            }
            other => key.push(other),
        }
    }
    key
}

/// Monitor loop for one watched path.
async fn supervise(
    handle: WatcherHandle,
    options: WatchOptions,
    ctx: UnitContext,
    registry: Arc<Registry>,
    policy: RestartPolicy,
) {
    let mut mode = StartMode::Baseline;
    let mut crashes: VecDeque<Instant> = VecDeque::new();

    loop {
        let unit = WatcherUnit::new(
            handle.path().to_path_buf(),
            options.interval,
            options.exclude.clone(),
            ctx.clone(),
        );
        let task = tokio::spawn(unit.run(mode, handle.clone(), handle.stop_signal()));

        let reason = match task.await {
            Ok(Ok(())) => break,
            Ok(Err(err)) => format!("{err:#}"),
            Err(join_err) if join_err.is_panic() => "watcher panicked".to_string(),
            Err(join_err) => {
                warn!(path = %handle.path().display(), "watcher task cancelled: {join_err}");
                break;
            }
        };

        if handle.stop_requested() {
            warn!(
                path = %handle.path().display(),
                "watcher failed while stopping; not restarting: {reason}"
            );
            break;
        }

        if !admit_restart(&mut crashes, Instant::now(), policy) {
            error!(
                path = %handle.path().display(),
                max_restarts = policy.max_restarts,
                window_ms = policy.window.as_millis() as u64,
                "watcher keeps failing; giving up: {reason}"
            );
            break;
        }

        let restarts = handle.record_restart();
        warn!(
            path = %handle.path().display(),
            restarts,
            "watcher exited abnormally; restarting with empty snapshot: {reason}"
        );
        handle.set_state(UnitState::Restarting);
        mode = StartMode::Empty;
    }

    registry.unregister_handle(&handle);
    handle.set_state(UnitState::Terminated);
}

/// Record a crash at `now` and decide whether another restart is allowed.
fn admit_restart(crashes: &mut VecDeque<Instant>, now: Instant, policy: RestartPolicy) -> bool {
    while let Some(oldest) = crashes.front() {
        if now.duration_since(*oldest) > policy.window {
            crashes.pop_front();
        } else {
            break;
        }
    }
    crashes.push_back(now);
    crashes.len() <= policy.max_restarts as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn restart_budget_is_per_window() {
        let policy = RestartPolicy {
            max_restarts: 2,
            window: Duration::from_secs(5),
        };
        let start = Instant::now();
        let mut crashes = VecDeque::new();

        assert!(admit_restart(&mut crashes, start, policy));
        assert!(admit_restart(&mut crashes, start + Duration::from_secs(1), policy));
        assert!(!admit_restart(&mut crashes, start + Duration::from_secs(2), policy));

        // Older crashes fall out of the window.
        assert!(admit_restart(&mut crashes, start + Duration::from_secs(8), policy));
    }

    #[test]
    fn watch_key_cleans_dot_components() {
        assert_eq!(watch_key(Path::new("/proj/./docs/../notes/")), PathBuf::from("/proj/notes"));
        assert_eq!(watch_key(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn watch_key_makes_relative_paths_absolute() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(watch_key(Path::new("notes")), cwd.join("notes"));
        assert_eq!(watch_key(Path::new("./notes/.")), cwd.join("notes"));
    }

    #[test]
    fn zero_budget_never_restarts() {
        let policy = RestartPolicy {
            max_restarts: 0,
            window: Duration::from_secs(5),
        };
        let mut crashes = VecDeque::new();
        assert!(!admit_restart(&mut crashes, Instant::now(), policy));
    }
}
