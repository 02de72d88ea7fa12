//! Build orchestration: host events in, build tool invocations out.
//!
//! ```text
//! host event ─► HookTable ─► BuildOrchestrator::build ─► CommandRunner::run
//!                                   │
//!                                   └─(watch)─► ChangeWatcher ─► rebuild ─┐
//!                                                     ▲                   │
//!                                                     └───────────────────┘
//! ```
//!
//! Every successful build is followed by a best-effort
//! [`BUILD_COMPLETED_EVENT`] on the host bus.

mod host;
#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use parking_lot::Mutex;

use crate::config::BuildConfig;
use crate::exec::{CommandRunner, Environment, ExecError, ProcessRunner};
use crate::hooks::{self, HookAction, HookTable, BUILD_COMPLETED_EVENT};
use crate::log::{BuildLog, TracingLog};
use crate::paths::{join_under, normalize};
use crate::watch::{ChangeWatcher, SettledCallback, WatchError, WatchHandle, WatchSet};

pub use host::{Host, LocalHost};

/// Why a build did not produce its artifact.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

impl BuildError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::Exec(e) => e.exit_code(),
            BuildError::Watch(_) => None,
        }
    }

    pub fn command(&self) -> Option<&str> {
        match self {
            BuildError::Exec(e) => e.command(),
            BuildError::Watch(_) => None,
        }
    }
}

/// A host-triggered build failed; the host run should end unsuccessfully.
///
/// The orchestrator never exits the process itself. Whoever owns the process
/// decides what to do with this.
#[derive(Debug, thiserror::Error)]
#[error("hook \"{event}\" failed")]
pub struct FatalOutcome {
    pub event: String,
    #[source]
    pub source: BuildError,
}

impl FatalOutcome {
    /// Status the host process should exit with.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Absolute path of the build file that was used.
    pub build_file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Building,
    /// Watch mode armed, no build running.
    Watching,
    /// Watch mode armed, a build is running.
    Rebuilding,
}

/// Binds host events to builds of one configured build file.
///
/// Cheap to clone; clones share the hook table, the build lock and the
/// armed watcher.
#[derive(Clone)]
pub struct BuildOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    config: BuildConfig,
    host: Arc<dyn Host>,
    runner: Arc<dyn CommandRunner>,
    log: Arc<dyn BuildLog>,
    hooks: HookTable,
    // One build at a time, whether host-triggered or from the watcher.
    build_lock: tokio::sync::Mutex<()>,
    building: AtomicBool,
    watcher: Mutex<Option<WatchHandle>>,
}

impl BuildOrchestrator {
    /// Orchestrator that spawns real processes and logs through `tracing`.
    pub fn new(config: BuildConfig, host: Arc<dyn Host>) -> Self {
        Self::with_parts(
            config,
            host,
            Arc::new(ProcessRunner),
            Arc::new(TracingLog::default()),
        )
    }

    pub fn with_parts(
        config: BuildConfig,
        host: Arc<dyn Host>,
        runner: Arc<dyn CommandRunner>,
        log: Arc<dyn BuildLog>,
    ) -> Self {
        let hooks = hooks::register(
            hooks::builtin_hooks(&config),
            &config.extra_bindings,
            log.as_ref(),
        );
        Self {
            inner: Arc::new(Inner {
                config,
                host,
                runner,
                log,
                hooks,
                build_lock: tokio::sync::Mutex::new(()),
                building: AtomicBool::new(false),
                watcher: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.inner.config
    }

    pub fn hooks(&self) -> &HookTable {
        &self.inner.hooks
    }

    pub fn state(&self) -> OrchestratorState {
        let building = self.inner.building.load(Ordering::SeqCst);
        match (self.is_watching(), building) {
            (false, false) => OrchestratorState::Idle,
            (false, true) => OrchestratorState::Building,
            (true, false) => OrchestratorState::Watching,
            (true, true) => OrchestratorState::Rebuilding,
        }
    }

    pub fn is_watching(&self) -> bool {
        self.inner.watcher.lock().is_some()
    }

    /// Absolute build file path for the current configuration.
    pub fn build_file(&self) -> PathBuf {
        self.inner.build_file()
    }

    /// The exact argv `make(target)` runs.
    pub fn command_line(&self, target: &str) -> Vec<String> {
        self.inner.command_line(&self.inner.build_file(), target)
    }

    /// Run the build tool once for `target`.
    pub async fn make(&self, target: &str) -> Result<BuildOutcome, BuildError> {
        self.inner.make(target).await
    }

    /// Build the configured target, then optionally keep rebuilding on change.
    ///
    /// With `watch`, the initial build must succeed before anything is
    /// watched; its failure is returned and no watcher is armed. Rebuild
    /// failures afterwards are logged and never reach this caller.
    pub async fn build(&self, watch: bool) -> Result<BuildOutcome, BuildError> {
        let outcome = self.inner.build_once().await?;
        if watch {
            self.arm(&outcome)?;
        }
        Ok(outcome)
    }

    /// Dispatch a host lifecycle event through the hook table.
    pub async fn fire(&self, event: &str) -> Result<(), FatalOutcome> {
        let Some(hook) = self.inner.hooks.get(event) else {
            self.inner
                .log
                .verbose(&format!("No hook registered for \"{event}\""));
            return Ok(());
        };

        let result = match &hook.action {
            HookAction::Noop => return Ok(()),
            HookAction::Build { watch } => {
                self.inner.log.verbose(event);
                self.build(*watch).await.map(drop)
            }
            HookAction::Make { target } => {
                self.inner.log.verbose(event);
                self.inner.make(target).await.map(drop)
            }
        };

        result.map_err(|source| {
            self.inner.log.error(&source.to_string());
            FatalOutcome {
                event: event.to_string(),
                source,
            }
        })
    }

    /// Drop the armed watcher, if any.
    pub fn stop_watching(&self) {
        self.inner.watcher.lock().take();
    }

    fn arm(&self, outcome: &BuildOutcome) -> Result<(), BuildError> {
        let inner = &self.inner;
        let set = WatchSet::resolve(
            &normalize(inner.host.service_path()),
            &outcome.build_file,
            &inner.config.watch_paths,
        );
        let listing = set
            .entries()
            .iter()
            .map(|e| format!(" - {}", e.path().display()))
            .collect::<Vec<_>>()
            .join("\n");
        inner
            .log
            .verbose(&format!("Watching for changes in:\n{listing}"));

        // Weak, so the watcher stored inside `Inner` does not keep it alive.
        let weak: Weak<Inner> = Arc::downgrade(inner);
        let on_settled: SettledCallback = Arc::new(move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.rebuild().await;
                }
            }
            .boxed()
        });

        let handle = ChangeWatcher::arm(&set, &inner.config.watch.options(), on_settled)?;
        // Replacing an earlier handle stops that watcher.
        *inner.watcher.lock() = Some(handle);
        Ok(())
    }
}

impl std::fmt::Debug for BuildOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOrchestrator")
            .field("config", &self.inner.config)
            .field("hooks", &self.inner.hooks)
            .field("state", &self.state())
            .finish()
    }
}

impl Inner {
    fn build_file(&self) -> PathBuf {
        join_under(&normalize(self.host.service_path()), &self.config.build_file)
    }

    /// An empty target is left out so the tool picks its default goal.
    fn command_line(&self, build_file: &Path, target: &str) -> Vec<String> {
        let mut argv = vec![
            self.config.tool.clone(),
            "-f".to_string(),
            build_file.to_string_lossy().into_owned(),
        ];
        if !target.is_empty() {
            argv.push(target.to_string());
        }
        argv
    }

    async fn make(&self, target: &str) -> Result<BuildOutcome, BuildError> {
        let build_file = self.build_file();
        let workdir = build_file
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let argv = self.command_line(&build_file, target);

        let _guard = self.build_lock.lock().await;
        self.log.verbose(&format!("Making \"{target}\"..."));

        let env = Environment::capture(self.host.environment());
        let _building = BuildingFlag::raise(&self.building);
        self.runner.run(&argv, &workdir, &env).await?;

        self.log.log(&format!("Made \"{target}\"..."));
        Ok(BuildOutcome { build_file })
    }

    async fn build_once(&self) -> Result<BuildOutcome, BuildError> {
        let outcome = self.make(&self.config.target).await?;
        if let Err(e) = self.host.emit(BUILD_COMPLETED_EVENT).await {
            self.log.warning(&format!(
                "Unable to deliver \"{BUILD_COMPLETED_EVENT}\" notification: {e:#}"
            ));
        }
        Ok(outcome)
    }

    async fn rebuild(&self) {
        self.log.log("Change detected, rebuilding...");
        if let Err(e) = self.build_once().await {
            self.log.error(&e.to_string());
        }
    }
}

/// Marks a build as running until dropped, including when the build future
/// is cancelled.
struct BuildingFlag<'a>(&'a AtomicBool);

impl<'a> BuildingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for BuildingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
