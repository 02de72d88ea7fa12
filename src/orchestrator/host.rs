use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use crate::config::Config;

/// The application that loads the orchestrator and fires lifecycle events
/// into it.
#[async_trait]
pub trait Host: Send + Sync {
    /// Root that the build file and watch paths are resolved against.
    fn service_path(&self) -> &Path;

    /// Variables the host declares for builds. `None` unsets a variable.
    ///
    /// Read on every build, so changes between triggers are picked up.
    fn environment(&self) -> BTreeMap<String, Option<String>>;

    /// Deliver an outbound event on the host bus.
    async fn emit(&self, event: &str) -> anyhow::Result<()>;
}

/// Host used by the standalone binary: config-driven, emits to the log.
#[derive(Debug)]
pub struct LocalHost {
    service_path: PathBuf,
    environment: RwLock<BTreeMap<String, String>>,
}

impl LocalHost {
    pub fn new(service_path: impl Into<PathBuf>, environment: BTreeMap<String, String>) -> Self {
        Self {
            service_path: service_path.into(),
            environment: RwLock::new(environment),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.service_path.clone(),
            config.provider.environment.clone(),
        )
    }

    pub fn set_var(&self, key: impl Into<String>, value: impl Into<String>) {
        self.environment.write().insert(key.into(), value.into());
    }
}

#[async_trait]
impl Host for LocalHost {
    fn service_path(&self) -> &Path {
        &self.service_path
    }

    fn environment(&self) -> BTreeMap<String, Option<String>> {
        self.environment
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), Some(v.clone())))
            .collect()
    }

    async fn emit(&self, event: &str) -> anyhow::Result<()> {
        info!(event, "host event emitted");
        Ok(())
    }
}
