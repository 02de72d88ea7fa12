//! Logging capability handed to every component.
//!
//! Hosts that carry their own logger implement [`BuildLog`]; everyone else
//! gets [`TracingLog`], which forwards to `tracing`.

use tracing::{debug, error, info, warn};

/// Prefix applied to every message emitted through [`TracingLog`].
pub const LOG_PREFIX: &str = "[make]";

/// Four-level logger used by the orchestrator, registry and runner.
pub trait BuildLog: Send + Sync {
    fn log(&self, message: &str);
    fn verbose(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default logger backed by `tracing`.
///
/// `verbose` messages go to `debug` unless verbose output was requested, in
/// which case they are promoted to `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog {
    verbose: bool,
}

impl TracingLog {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl BuildLog for TracingLog {
    fn log(&self, message: &str) {
        info!("{LOG_PREFIX} {message}");
    }

    fn verbose(&self, message: &str) {
        if self.verbose {
            info!("{LOG_PREFIX} {message}");
        } else {
            debug!("{LOG_PREFIX} {message}");
        }
    }

    fn warning(&self, message: &str) {
        warn!("{LOG_PREFIX} {message}");
    }

    fn error(&self, message: &str) {
        error!("{LOG_PREFIX} {message}");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use parking_lot::Mutex;

    use super::BuildLog;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Level {
        Log,
        Verbose,
        Warning,
        Error,
    }

    /// Logger that records every line for assertions.
    #[derive(Default)]
    pub struct RecordingLog {
        lines: Mutex<Vec<(Level, String)>>,
    }

    impl RecordingLog {
        pub fn lines(&self, level: Level) -> Vec<String> {
            self.lines
                .lock()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        }

        fn push(&self, level: Level, message: &str) {
            self.lines.lock().push((level, message.to_string()));
        }
    }

    impl BuildLog for RecordingLog {
        fn log(&self, message: &str) {
            self.push(Level::Log, message);
        }
        fn verbose(&self, message: &str) {
            self.push(Level::Verbose, message);
        }
        fn warning(&self, message: &str) {
            self.push(Level::Warning, message);
        }
        fn error(&self, message: &str) {
            self.push(Level::Error, message);
        }
    }
}
