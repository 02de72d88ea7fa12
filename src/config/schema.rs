use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::watch::WatchOptions;

/// Build tool invoked when none is configured.
pub const DEFAULT_TOOL: &str = "make";
/// Build file used when none is configured, relative to the service root.
pub const DEFAULT_BUILD_FILE: &str = "./Makefile";

/// `[make]` table: what to build and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Target passed to the build tool. Empty runs the build file's default target.
    pub target: String,
    /// Build file, relative to the service root.
    #[serde(alias = "makefile")]
    pub build_file: PathBuf,
    /// Extra paths or glob patterns to watch, relative to the service root.
    #[serde(alias = "watch")]
    pub watch_paths: Vec<String>,
    /// Keep rebuilding on change after the host's offline start hook.
    #[serde(alias = "reload_handler")]
    pub rebuild_on_host_reload: bool,
    /// Host event name -> target built when that event fires.
    #[serde(alias = "hooks")]
    pub extra_bindings: BTreeMap<String, String>,
    /// Build tool executable, looked up on PATH.
    pub tool: String,
    #[serde(rename = "watcher")]
    pub watch: WatchConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            build_file: PathBuf::from(DEFAULT_BUILD_FILE),
            watch_paths: Vec::new(),
            rebuild_on_host_reload: false,
            extra_bindings: BTreeMap::new(),
            tool: DEFAULT_TOOL.to_string(),
            watch: WatchConfig::default(),
        }
    }
}

/// `[make.watcher]` table: polling cadence and settle window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    pub poll_interval_ms: u64,
    pub stability_threshold_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        let defaults = WatchOptions::default();
        Self {
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
            stability_threshold_ms: defaults.stability_threshold.as_millis() as u64,
        }
    }
}

impl WatchConfig {
    pub fn options(&self) -> WatchOptions {
        WatchOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            stability_threshold: Duration::from_millis(self.stability_threshold_ms),
        }
    }
}

/// `[provider]` table: state the host contributes to every build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Variables overlaid on the ambient environment of each build.
    pub environment: BTreeMap<String, String>,
}
