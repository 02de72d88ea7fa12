//! Configuration file loading.
//!
//! A `hookmake.toml` looks like:
//!
//! ```toml
//! service_path = "~/src/my-service"   # optional, defaults to the file's directory
//!
//! [make]
//! target = "build"
//! makefile = "./Makefile"
//! watch = ["src/", "include/*.h"]
//! reload_handler = true
//!
//! [make.hooks]
//! "before:deploy:function" = "deploy-prep"
//!
//! [provider.environment]
//! STAGE = "dev"
//! ```

pub mod schema;

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use schema::{BuildConfig, ProviderConfig, WatchConfig, DEFAULT_BUILD_FILE, DEFAULT_TOOL};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "hookmake.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid service_path {path:?}: {reason}")]
    ServicePath { path: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
struct RawConfig {
    service_path: Option<String>,
    make: BuildConfig,
    provider: ProviderConfig,
}

/// Fully resolved configuration for one host session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root that the build file and watch paths are resolved against.
    pub service_path: PathBuf,
    pub make: BuildConfig,
    pub provider: ProviderConfig,
}

impl Config {
    /// Load and resolve a config file. A relative or missing `service_path`
    /// is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self::from_toml(&content, &base)
    }

    /// Parse config text, resolving `service_path` against `base`.
    pub fn from_toml(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let service_path = match raw.service_path {
            Some(p) => {
                let expanded =
                    shellexpand::full(&p).map_err(|e| ConfigError::ServicePath {
                        path: p.clone(),
                        reason: e.to_string(),
                    })?;
                base.join(expanded.as_ref())
            }
            None => base.to_path_buf(),
        };
        Ok(Self {
            service_path,
            make: raw.make,
            provider: raw.provider,
        })
    }
}
