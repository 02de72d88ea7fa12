//! Change watching for the rebuild loop.
//!
//! Paths are polled rather than subscribed to, so changes on network mounts
//! and container volumes are still seen. Watch entries may be globs or name
//! paths that do not exist yet; each change is matched against them. Bursts
//! of changes are collapsed into one "settled" signal once the tree has been
//! quiet for the stability threshold.

pub mod watcher;
mod watch_set;

pub use watch_set::{WatchEntry, WatchSet};
pub use watcher::{ChangeWatcher, SettledCallback, WatchHandle, WatchOptions};

/// Failures while arming a watcher.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to start file watcher: {0}")]
    Init(#[from] notify::Error),
}
