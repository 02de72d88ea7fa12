//! hookmake: bind host lifecycle hooks to make-style builds.
//!
//! A host (a deployment framework, a local dev server, or the bundled CLI)
//! fires named lifecycle events. The [`BuildOrchestrator`] maps them to build
//! tool invocations, optionally keeps rebuilding when watched files change, and
//! announces every successful build back on the host bus.

pub mod config;
pub mod exec;
pub mod hooks;
pub mod log;
pub mod orchestrator;
mod paths;
pub mod watch;

pub use config::{BuildConfig, Config};
pub use exec::{CommandRunner, Environment, ExecError, ProcessRunner};
pub use hooks::{HookAction, HookTable, BUILD_COMPLETED_EVENT};
pub use log::{BuildLog, TracingLog};
pub use orchestrator::{
    BuildError, BuildOrchestrator, BuildOutcome, FatalOutcome, Host, LocalHost, OrchestratorState,
};
pub use watch::{ChangeWatcher, WatchSet};
