// src/watch/snapshot.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::discovery::{collect_matching_files, ContentHash, Discovery, FileMatcher};
use crate::fs::FileSystem;

/// Content hashes of every tracked file under one root, keyed by absolute path.
///
/// A snapshot is rebuilt from scratch on every scan and replaces its
/// predecessor wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHashSnapshot {
    hashes: HashMap<PathBuf, ContentHash>,
}

impl FileHashSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` for files matching the collaborator's patterns (minus
    /// `exclude`) and hash each one.
    ///
    /// Files that cannot be read are left out, exactly as if they did not
    /// exist. A missing root yields an empty snapshot.
    pub fn scan(
        fs: &dyn FileSystem,
        discovery: &dyn Discovery,
        root: &Path,
        exclude: &[String],
    ) -> Self {
        let matcher = FileMatcher::compile(&discovery.registered_patterns(), exclude);
        let mut hashes = HashMap::new();

        for path in collect_matching_files(fs, root, &matcher) {
            match fs.read(&path) {
                Ok(contents) => {
                    let hash = discovery.hash_file(&contents);
                    hashes.insert(path, hash);
                }
                Err(err) => {
                    debug!(path = %path.display(), "skipping unreadable file: {err:#}");
                }
            }
        }

        Self { hashes }
    }

    /// Run [`FileHashSnapshot::scan`] on the blocking thread pool.
    ///
    /// Walking, reading and hashing a large tree would otherwise stall the
    /// runtime worker the caller is on. A panic inside a collaborator comes
    /// back as an error.
    pub async fn spawn_scan(
        fs: Arc<dyn FileSystem>,
        discovery: Arc<dyn Discovery>,
        root: PathBuf,
        exclude: Vec<String>,
    ) -> Result<Self> {
        let scan_root = root.clone();
        tokio::task::spawn_blocking(move || {
            Self::scan(fs.as_ref(), discovery.as_ref(), &scan_root, &exclude)
        })
        .await
        .with_context(|| format!("scan of {:?} did not complete", root))
    }

    pub fn get(&self, path: &Path) -> Option<&ContentHash> {
        self.hashes.get(path)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Paths that are new in `self` or whose hash differs from `previous`.
    ///
    /// Paths only present in `previous` (deleted or now unreadable files) are
    /// not reported. Order is unspecified.
    pub fn changed_since(&self, previous: &FileHashSnapshot) -> Vec<PathBuf> {
        self.hashes
            .iter()
            .filter(|(path, hash)| previous.hashes.get(*path) != Some(*hash))
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl FromIterator<(PathBuf, ContentHash)> for FileHashSnapshot {
    fn from_iter<T: IntoIterator<Item = (PathBuf, ContentHash)>>(iter: T) -> Self {
        Self {
            hashes: iter.into_iter().collect(),
        }
    }
}
