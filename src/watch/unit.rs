// src/watch/unit.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::bus::{ChangeMessage, EventBus, FILE_CHANGED_TOPIC};
use crate::discovery::Discovery;
use crate::fs::FileSystem;
use crate::watch::handle::{UnitState, WatcherHandle};
use crate::watch::snapshot::FileHashSnapshot;

/// How a unit obtains its first snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Scan once without publishing, so startup reports nothing.
    Baseline,
    /// Start from an empty snapshot. Used after a crash: the first tick then
    /// reports every existing file.
    Empty,
}

/// Collaborators shared by every unit of a supervisor.
#[derive(Debug, Clone)]
pub struct UnitContext {
    pub fs: Arc<dyn FileSystem>,
    pub discovery: Arc<dyn Discovery>,
    pub bus: Arc<dyn EventBus>,
}

/// Polls one project root and publishes a message per changed file.
///
/// The snapshot is owned by the unit alone; nothing outside can reach it
/// between ticks.
#[derive(Debug)]
pub struct WatcherUnit {
    root: PathBuf,
    interval: Duration,
    exclude: Vec<String>,
    snapshot: FileHashSnapshot,
    ctx: UnitContext,
}

impl WatcherUnit {
    pub fn new(
        root: impl Into<PathBuf>,
        interval: Duration,
        exclude: Vec<String>,
        ctx: UnitContext,
    ) -> Self {
        Self {
            root: root.into(),
            interval,
            exclude,
            snapshot: FileHashSnapshot::new(),
            ctx,
        }
    }

    pub fn snapshot(&self) -> &FileHashSnapshot {
        &self.snapshot
    }

    /// Record the current state of the tree without publishing anything.
    pub async fn baseline(&mut self) -> Result<()> {
        self.snapshot = self.scan().await?;
        info!(
            root = %self.root.display(),
            files = self.snapshot.len(),
            "baseline scan complete"
        );
        Ok(())
    }

    /// One poll tick: scan, diff against the stored snapshot, publish one
    /// message per changed path, then replace the snapshot.
    ///
    /// Returns the changed paths in publish order.
    pub async fn tick(&mut self) -> Result<Vec<PathBuf>> {
        let next = self.scan().await?;
        let changed = next.changed_since(&self.snapshot);

        for path in &changed {
            debug!(path = %path.display(), "file changed");
            self.ctx
                .bus
                .publish(
                    FILE_CHANGED_TOPIC,
                    ChangeMessage::FileChanged { path: path.clone() },
                )
                .with_context(|| format!("publishing change for {:?}", path))?;
        }

        if !changed.is_empty() {
            info!(
                root = %self.root.display(),
                changed = changed.len(),
                "published file changes"
            );
        }

        self.snapshot = next;
        Ok(changed)
    }

    async fn scan(&self) -> Result<FileHashSnapshot> {
        FileHashSnapshot::spawn_scan(
            Arc::clone(&self.ctx.fs),
            Arc::clone(&self.ctx.discovery),
            self.root.clone(),
            self.exclude.clone(),
        )
        .await
    }

    /// Drive the unit until a stop is requested.
    ///
    /// The next tick is scheduled one interval after the previous one
    /// finished, so ticks never overlap and a slow scan only delays the
    /// schedule. Scans run on the blocking pool. A stop request is observed
    /// between ticks; a tick already running completes and publishes first.
    ///
    /// Returns `Ok(())` on a requested stop. An error or a panic from a
    /// collaborator is an abnormal exit.
    pub async fn run(
        mut self,
        mode: StartMode,
        handle: WatcherHandle,
        mut stop: watch::Receiver<bool>,
    ) -> Result<()> {
        if mode == StartMode::Baseline {
            handle.set_state(UnitState::Initializing);
            self.baseline().await?;
        }
        handle.set_state(UnitState::Polling);

        loop {
            tokio::select! {
                biased;
                _ = async { let _ = stop.wait_for(|stopped| *stopped).await; } => {
                    debug!(root = %self.root.display(), "stop requested");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            self.tick().await?;
        }
    }
}
