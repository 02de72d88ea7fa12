//! Fakes shared by the orchestrator and hook tests.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::exec::{CommandRunner, Environment, ExecError};

use super::Host;

#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub argv: Vec<String>,
    pub workdir: PathBuf,
    pub env: Environment,
}

/// Runner that records invocations and replays scripted exit codes.
///
/// Once the script runs out every run succeeds.
#[derive(Default)]
pub struct FakeRunner {
    runs: Mutex<Vec<RecordedRun>>,
    script: Mutex<VecDeque<i32>>,
    delay: Option<Duration>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeRunner {
    pub fn with_exit_codes(codes: &[i32]) -> Self {
        Self {
            script: Mutex::new(codes.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().clone()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(
        &self,
        argv: &[String],
        workdir: &Path,
        env: &Environment,
    ) -> Result<(), ExecError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.runs.lock().push(RecordedRun {
            argv: argv.to_vec(),
            workdir: workdir.to_path_buf(),
            env: env.clone(),
        });
        let code = self.script.lock().pop_front().unwrap_or(0);
        self.active.fetch_sub(1, Ordering::SeqCst);
        if code == 0 {
            Ok(())
        } else {
            Err(ExecError::NonZeroExit {
                command: argv[0].clone(),
                code: Some(code),
            })
        }
    }
}

/// Host with a mutable environment and a counting event bus.
pub struct FakeHost {
    service_path: PathBuf,
    environment: Mutex<BTreeMap<String, Option<String>>>,
    emitted: Mutex<Vec<String>>,
    fail_emit: bool,
}

impl FakeHost {
    pub fn new(service_path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self::build(service_path.into(), false))
    }

    pub fn failing_bus(service_path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self::build(service_path.into(), true))
    }

    fn build(service_path: PathBuf, fail_emit: bool) -> Self {
        Self {
            service_path,
            environment: Mutex::new(BTreeMap::new()),
            emitted: Mutex::new(Vec::new()),
            fail_emit,
        }
    }

    pub fn set_var(&self, key: &str, value: Option<&str>) {
        self.environment
            .lock()
            .insert(key.to_string(), value.map(str::to_string));
    }

    pub fn emitted(&self) -> Vec<String> {
        self.emitted.lock().clone()
    }
}

#[async_trait]
impl Host for FakeHost {
    fn service_path(&self) -> &Path {
        &self.service_path
    }

    fn environment(&self) -> BTreeMap<String, Option<String>> {
        self.environment.lock().clone()
    }

    async fn emit(&self, event: &str) -> anyhow::Result<()> {
        self.emitted.lock().push(event.to_string());
        if self.fail_emit {
            anyhow::bail!("event bus is closed");
        }
        Ok(())
    }
}

/// Poll `check` until it holds or five seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
