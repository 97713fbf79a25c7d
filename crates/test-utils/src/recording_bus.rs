use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use pollwatch::bus::{ChangeMessage, EventBus};

/// A bus that:
/// - records every `(topic, message)` it is asked to publish
/// - can be told to reject publishes, to simulate a broken transport.
#[derive(Debug, Clone, Default)]
pub struct RecordingBus {
    published: Arc<Mutex<Vec<(String, ChangeMessage)>>>,
    reject: Arc<AtomicBool>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail (`true`) or succeed (`false`).
    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<(String, ChangeMessage)> {
        std::mem::take(&mut *self.published.lock().unwrap())
    }

    /// Drain the recorded paths, sorted.
    pub fn take_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .take()
            .into_iter()
            .map(|(_, msg)| msg.path().clone())
            .collect();
        paths.sort();
        paths
    }
}

impl EventBus for RecordingBus {
    fn publish(&self, topic: &str, message: ChangeMessage) -> Result<()> {
        if self.reject.load(Ordering::SeqCst) {
            bail!("bus rejected publish on {topic}");
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), message));
        Ok(())
    }
}
