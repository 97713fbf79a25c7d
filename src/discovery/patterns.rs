// src/discovery/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::fs::FileSystem;

/// Compiled include/exclude glob patterns for one watched root.
///
/// Patterns are relative to the root; `matches` expects a root-relative path
/// with forward slashes, e.g. `"docs/intro.md"`.
#[derive(Clone)]
pub struct FileMatcher {
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for FileMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileMatcher")
            .field("include", &self.include.len())
            .field("exclude", &self.exclude.as_ref().map_or(0, GlobSet::len))
            .finish()
    }
}

impl FileMatcher {
    /// Compile patterns leniently: an invalid glob is logged and skipped so a
    /// single bad registration cannot take the whole scan down.
    pub fn compile(include: &[String], exclude: &[String]) -> Self {
        let exclude = lenient_globset(exclude, "exclude");
        Self {
            include: lenient_globset(include, "include"),
            exclude: (!exclude.is_empty()).then_some(exclude),
        }
    }

    /// Returns true if a root-relative path is included and not excluded.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// True when no include pattern survived compilation.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }
}

fn lenient_globset(patterns: &[String], kind: &str) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        match Glob::new(pat) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => warn!(pattern = %pat, kind, "ignoring invalid glob: {err}"),
        }
    }
    builder.build().unwrap_or_else(|err| {
        warn!(kind, "failed to build globset: {err}");
        GlobSet::empty()
    })
}

/// Build a GlobSet from simple string patterns, failing on the first
/// invalid pattern. Used by config validation.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Convert a path into a string relative to `root`, with forward slashes.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Collect all files under `root` that the matcher accepts.
///
/// Directories that cannot be listed (missing root, permission errors,
/// removed mid-walk) are skipped; the walk never fails.
///
/// Symlinked directories below `root` are not descended into, so a link
/// back up the tree cannot make the walk loop. `root` itself may be a link.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    matcher: &FileMatcher,
) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if matcher.is_empty() {
        return files;
    }

    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %dir.display(), "skipping unreadable directory: {err:#}");
                continue;
            }
        };

        for path in entries {
            if fs.is_dir(&path) {
                if fs.is_symlink(&path) {
                    debug!(dir = %path.display(), "not following directory symlink");
                    continue;
                }
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Some(rel) = relative_str(root, &path) {
                    if matcher.matches(&rel) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files
}
