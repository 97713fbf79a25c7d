// src/discovery/mod.rs

//! File discovery and content hashing.
//!
//! Watchers consume this through the [`Discovery`] trait: it tells them which
//! glob patterns are currently registered and how to fingerprint a file's
//! contents. [`PatternDiscovery`] is the in-process implementation backed by
//! a fixed pattern list and BLAKE3.

pub mod hash;
pub mod patterns;

use std::fmt::Debug;
use std::sync::RwLock;

pub use hash::{hash_bytes, ContentHash};
pub use patterns::{build_globset, collect_matching_files, FileMatcher};

/// Collaborator that knows which files matter and how to fingerprint them.
///
/// Implementations must be cheap to call: `registered_patterns` is consulted
/// on every poll tick, `hash_file` once per matching file.
pub trait Discovery: Send + Sync + Debug {
    /// Glob patterns (relative to a watched root) of the files to track.
    fn registered_patterns(&self) -> Vec<String>;

    /// Change-detection fingerprint of a file's contents.
    fn hash_file(&self, contents: &[u8]) -> ContentHash;
}

/// Default patterns when neither config nor caller registers any.
pub const DEFAULT_PATTERNS: &[&str] = &["**/*.md"];

/// Pattern registry with BLAKE3 hashing.
///
/// Patterns can be registered at runtime; running watchers pick them up on
/// their next tick.
#[derive(Debug)]
pub struct PatternDiscovery {
    patterns: RwLock<Vec<String>>,
}

impl PatternDiscovery {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: RwLock::new(patterns.into_iter().map(Into::into).collect()),
        }
    }

    /// Add a pattern unless it is already registered.
    pub fn register(&self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        let mut patterns = self.patterns.write().unwrap_or_else(|e| e.into_inner());
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }
}

impl Default for PatternDiscovery {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERNS.iter().copied())
    }
}

impl Discovery for PatternDiscovery {
    fn registered_patterns(&self) -> Vec<String> {
        self.patterns
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn hash_file(&self, contents: &[u8]) -> ContentHash {
        hash_bytes(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let discovery = PatternDiscovery::new(["**/*.md"]);
        discovery.register("**/*.txt");
        discovery.register("**/*.md");

        assert_eq!(discovery.registered_patterns(), vec!["**/*.md", "**/*.txt"]);
    }

    #[test]
    fn default_tracks_markdown() {
        let discovery = PatternDiscovery::default();
        assert_eq!(discovery.registered_patterns(), vec!["**/*.md"]);
        assert_eq!(discovery.hash_file(b"x"), hash_bytes(b"x"));
    }
}
