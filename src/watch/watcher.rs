//! Polling watcher with a settle-window debounce.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use notify::{EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::{WatchError, WatchSet};

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Default quiet period before a burst of changes counts as settled.
pub const DEFAULT_STABILITY_THRESHOLD: Duration = Duration::from_millis(500);

/// Invoked once per settled burst of changes.
pub type SettledCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub poll_interval: Duration,
    pub stability_threshold: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
        }
    }
}

/// Keeps a watcher alive. Dropping it stops polling and the settle task.
pub struct WatchHandle {
    _watcher: PollWatcher,
    task: JoinHandle<()>,
    watched: Vec<PathBuf>,
}

impl WatchHandle {
    /// Paths registered with the poller.
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("watched", &self.watched)
            .finish_non_exhaustive()
    }
}

pub struct ChangeWatcher;

impl ChangeWatcher {
    /// Start polling `set` and call `on_settled` after each settled burst.
    ///
    /// Must be called from within a tokio runtime; the callback runs on that
    /// runtime, never on the polling thread. The state present when the
    /// watcher starts is not reported as a change. Entries that do not exist
    /// yet are polled through their nearest existing parent, so they are
    /// picked up once created; changes that match no entry are ignored.
    pub fn arm(
        set: &WatchSet,
        options: &WatchOptions,
        on_settled: SettledCallback,
    ) -> Result<WatchHandle, WatchError> {
        let (tx, rx) = mpsc::unbounded_channel::<()>();

        let filter = set.clone();
        let mut watcher = PollWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    if !event.paths.iter().any(|p| filter.matches(p)) {
                        return;
                    }
                    trace!(paths = ?event.paths, kind = ?event.kind, "change observed");
                    // Receiver gone means the handle was dropped.
                    let _ = tx.send(());
                }
                Err(err) => warn!("file watcher error: {err}"),
            },
            notify::Config::default().with_poll_interval(options.poll_interval),
        )?;

        let anchors = set.anchors();
        let mut watched = Vec::with_capacity(anchors.len());
        for path in anchors {
            let mode = if path.is_dir() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            match watcher.watch(&path, mode) {
                Ok(()) => watched.push(path),
                Err(err) => warn!(path = %path.display(), "failed to watch path: {err}"),
            }
        }
        debug!(count = watched.len(), "file watcher armed");

        let task = tokio::spawn(settle(rx, options.stability_threshold, on_settled));

        Ok(WatchHandle {
            _watcher: watcher,
            task,
            watched,
        })
    }
}

/// Collapse change signals into settled callbacks.
///
/// A change opens a window; every further change restarts the stability
/// timer. The callback is awaited before the next change is read, so
/// callbacks never overlap.
pub(crate) async fn settle(
    mut rx: UnboundedReceiver<()>,
    stability_threshold: Duration,
    on_settled: SettledCallback,
) {
    while rx.recv().await.is_some() {
        loop {
            match tokio::time::timeout(stability_threshold, rx.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_elapsed) => break,
            }
        }
        on_settled().await;
    }
}
