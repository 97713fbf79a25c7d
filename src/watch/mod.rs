// src/watch/mod.rs

//! Poll-based change detection.
//!
//! This module is responsible for:
//! - Taking content-hash snapshots of a project root (`snapshot`).
//! - Running one polling unit per root that diffs successive snapshots and
//!   publishes changed paths (`unit`).
//! - Keeping a directory of active units (`registry`) and supervising their
//!   lifecycle, including restarts after crashes (`supervisor`).
//!
//! Deleted files are not reported: a path that disappears from the snapshot
//! simply stops being tracked.

pub mod handle;
pub mod registry;
pub mod snapshot;
pub mod supervisor;
pub mod unit;

pub use handle::{UnitState, WatcherHandle};
pub use registry::Registry;
pub use snapshot::FileHashSnapshot;
pub use supervisor::{watch_key, Supervisor};
pub use unit::{StartMode, UnitContext, WatcherUnit};
