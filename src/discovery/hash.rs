// src/discovery/hash.rs

use std::fmt;

use blake3::Hasher;

/// Content fingerprint of a single file.
///
/// Only used for change detection: two snapshots disagree on a file exactly
/// when its fingerprints differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an already-computed fingerprint (e.g. from a custom collaborator).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash file contents with BLAKE3 and return the hex digest.
pub fn hash_bytes(contents: &[u8]) -> ContentHash {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    ContentHash(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest_for_hello_world() {
        let hash = hash_bytes(b"hello world");
        assert_eq!(
            hash.as_str(),
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn different_contents_differ() {
        assert_ne!(hash_bytes(b"hello"), hash_bytes(b"HELLO"));
        assert_eq!(hash_bytes(b""), hash_bytes(b""));
    }
}
