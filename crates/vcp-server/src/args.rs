//! CLI argument definitions using clap
//!
//! - vcp                          # Start the server (default)
//! - vcp serve --port 7000        # Start with overrides
//! - vcp config show              # Print the effective configuration
//! - vcp config check             # Validate configuration and exit
//! - vcp parse reply.txt          # Dry-run the tool-call parser on a file or stdin

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vcp_core::config::{ConfigLoader, LogFormat, VcpConfig};
use vcp_core::error::VcpResult;

#[derive(Parser, Debug)]
#[command(name = "vcp")]
#[command(about = "VCP hub - tool-call protocol, message hub and request lifecycle server")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML or JSON configuration file
    #[arg(short, long, env = "VCP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Log level or filter directive
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    /// Ignore VCP_* environment overrides
    #[arg(long, global = true)]
    pub no_env: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP and WebSocket server
    Serve,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Parse tool-call blocks from a file (or stdin) and print them as JSON
    Parse {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the configuration
    Check,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Cli {
    /// Load file and environment configuration, then apply command-line overrides
    pub fn load_config(&self) -> VcpResult<VcpConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.with_file(path);
        }
        if !self.no_env {
            loader = loader.with_env();
        }
        let mut config = loader.load()?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut VcpConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format.into();
        }
    }
}
