use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use pollwatch::discovery::{hash_bytes, ContentHash, Discovery};
use tokio::sync::Notify;

/// A discovery collaborator whose failures are scripted by the test.
///
/// Panicking inside `registered_patterns` is how tests simulate a watcher
/// crashing mid-scan. Holding scans parks the scanning thread inside
/// `registered_patterns` so a test can act while a tick is in progress.
#[derive(Debug, Clone)]
pub struct ScriptedDiscovery {
    patterns: Vec<String>,
    panic_next: Arc<AtomicBool>,
    panic_always: Arc<AtomicBool>,
    scans: Arc<AtomicUsize>,
    gate: Arc<ScanGate>,
}

#[derive(Debug, Default)]
struct ScanGate {
    held: Mutex<bool>,
    released: Condvar,
    entered: Notify,
}

impl ScriptedDiscovery {
    pub fn new(patterns: &[&str]) -> Self {
        Self {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            panic_next: Arc::new(AtomicBool::new(false)),
            panic_always: Arc::new(AtomicBool::new(false)),
            scans: Arc::new(AtomicUsize::new(0)),
            gate: Arc::new(ScanGate::default()),
        }
    }

    /// Panic on the next scan only.
    pub fn panic_on_next_scan(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    /// Panic on every scan until turned off.
    pub fn set_panic_always(&self, on: bool) {
        self.panic_always.store(on, Ordering::SeqCst);
    }

    /// Number of scans started (including ones that panicked).
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// Block every scan that starts from now on until `release_scans`.
    ///
    /// Scans run on the blocking pool, so parking them does not stall the
    /// runtime. Always release before the test ends: the runtime waits for
    /// blocking threads when it shuts down.
    pub fn hold_scans(&self) {
        *self.gate.held.lock().unwrap() = true;
    }

    pub fn release_scans(&self) {
        *self.gate.held.lock().unwrap() = false;
        self.gate.released.notify_all();
    }

    /// Resolves once a scan is parked by `hold_scans`.
    pub async fn scan_entered(&self) {
        self.gate.entered.notified().await;
    }
}

impl Discovery for ScriptedDiscovery {
    fn registered_patterns(&self) -> Vec<String> {
        self.scans.fetch_add(1, Ordering::SeqCst);

        let mut held = self.gate.held.lock().unwrap();
        if *held {
            self.gate.entered.notify_one();
            while *held {
                held = self.gate.released.wait(held).unwrap();
            }
        }
        drop(held);

        if self.panic_always.load(Ordering::SeqCst) || self.panic_next.swap(false, Ordering::SeqCst)
        {
            panic!("scripted discovery failure");
        }
        self.patterns.clone()
    }

    fn hash_file(&self, contents: &[u8]) -> ContentHash {
        hash_bytes(contents)
    }
}
