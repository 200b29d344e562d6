//! Configuration loading and management
//!
//! Sources are applied in order: built-in defaults, a TOML/JSON file, then
//! `VCP_*` environment variables. The result is validated before use.

mod env_loader;
mod file_loader;
mod logging_config;
mod model;
pub mod timeouts;

pub use env_loader::{apply_env_overrides, apply_overrides};
pub use file_loader::load_from_file;
pub use logging_config::{LogFormat, LoggingConfig};
pub use model::{
    AuthConfig, ChatConfig, DistributedConfig, HubConfig, LifecycleConfig, ServerConfig,
    StdioToolConfig, ToolsConfig, UpstreamConfig, VcpConfig,
};

use crate::error::VcpResult;
use std::path::{Path, PathBuf};

/// Configuration loader with support for multiple sources
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    use_env: bool,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file source
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Add environment variables source
    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    /// Load configuration from all sources
    pub fn load(self) -> VcpResult<VcpConfig> {
        let mut config = match &self.file {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                load_from_file(path)?
            }
            None => VcpConfig::default(),
        };

        if self.use_env {
            apply_env_overrides(&mut config)?;
        }

        config.validate()?;
        Ok(config)
    }
}
