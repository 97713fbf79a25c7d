// src/bus.rs

//! Publish/subscribe plumbing for change notifications.
//!
//! Watchers only need [`EventBus::publish`]. [`LocalBus`] is an in-process
//! implementation with one `tokio::sync::broadcast` channel per topic.

use std::fmt::Debug;
use std::path::PathBuf;

use anyhow::Result;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Topic on which watchers announce changed files.
pub const FILE_CHANGED_TOPIC: &str = "file:changed";

/// Per-topic buffer of the local bus. Slow subscribers lag past this.
pub const DEFAULT_TOPIC_CAPACITY: usize = 1024;

/// Message published by a watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeMessage {
    /// Contents of `path` differ from the previous snapshot, or the file is new.
    FileChanged { path: PathBuf },
}

impl ChangeMessage {
    pub fn path(&self) -> &PathBuf {
        match self {
            ChangeMessage::FileChanged { path } => path,
        }
    }
}

/// Transport used by watchers to broadcast change messages.
pub trait EventBus: Send + Sync + Debug {
    fn publish(&self, topic: &str, message: ChangeMessage) -> Result<()>;
}

/// In-process bus. Topics are created lazily on first publish or subscribe.
#[derive(Debug)]
pub struct LocalBus {
    topics: DashMap<String, broadcast::Sender<ChangeMessage>>,
    capacity: usize,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to every message published on `topic` from now on.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<ChangeMessage> {
        self.sender(topic).subscribe()
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<ChangeMessage> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for LocalBus {
    fn publish(&self, topic: &str, message: ChangeMessage) -> Result<()> {
        // A send error only means nobody is subscribed right now.
        match self.sender(topic).send(message) {
            Ok(receivers) => trace!(topic, receivers, "published message"),
            Err(_) => trace!(topic, "published message with no subscribers"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_ok() {
        let bus = LocalBus::new();
        let msg = ChangeMessage::FileChanged {
            path: PathBuf::from("/proj/a.md"),
        };
        assert!(bus.publish(FILE_CHANGED_TOPIC, msg).is_ok());
    }

    #[test]
    fn subscribers_only_see_their_topic() {
        let bus = LocalBus::new();
        let mut changed = bus.subscribe(FILE_CHANGED_TOPIC);
        let mut other = bus.subscribe("other");

        let msg = ChangeMessage::FileChanged {
            path: PathBuf::from("/proj/a.md"),
        };
        bus.publish(FILE_CHANGED_TOPIC, msg.clone()).unwrap();

        assert_eq!(changed.try_recv().unwrap(), msg);
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn message_serializes_with_file_changed_tag() {
        let msg = ChangeMessage::FileChanged {
            path: PathBuf::from("/proj/a.md"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"event":"file_changed","path":"/proj/a.md"}"#);
    }
}
