// src/watch/registry.rs

use std::path::{Path, PathBuf};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::errors::{Result, WatchError};
use crate::watch::handle::WatcherHandle;

/// Directory of active watchers keyed by project path.
///
/// Registration is an atomic insert-if-absent, so two concurrent starts for
/// the same path can never both succeed.
#[derive(Debug, Default)]
pub struct Registry {
    entries: DashMap<PathBuf, WatcherHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `path`, failing if the path is taken.
    pub fn register(&self, path: &Path, handle: WatcherHandle) -> Result<()> {
        match self.entries.entry(path.to_path_buf()) {
            Entry::Occupied(_) => Err(WatchError::AlreadyWatching(path.to_path_buf())),
            Entry::Vacant(slot) => {
                slot.insert(handle);
                debug!(path = %path.display(), "registered watcher");
                Ok(())
            }
        }
    }

    pub fn lookup(&self, path: &Path) -> Option<WatcherHandle> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    pub fn unregister(&self, path: &Path) -> Option<WatcherHandle> {
        self.entries.remove(path).map(|(_, handle)| handle)
    }

    /// Remove the entry for `handle.path()` only if it still belongs to
    /// `handle`. Returns whether an entry was removed.
    pub fn unregister_handle(&self, handle: &WatcherHandle) -> bool {
        let removed = self
            .entries
            .remove_if(handle.path(), |_, current| current.same_watcher(handle))
            .is_some();
        if removed {
            debug!(path = %handle.path().display(), "unregistered watcher");
        }
        removed
    }

    /// Paths of all registered watchers, sorted.
    pub fn list(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.entries.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Every registered handle (used for shutdown).
    pub fn handles(&self) -> Vec<WatcherHandle> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }
}
