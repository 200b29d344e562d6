//! VCP hub server
//!
//! ```bash
//! cargo install --path crates/vcp-server
//! vcp --config vcp.toml
//! ```

use anyhow::Context;
use clap::Parser;
use std::io::Read;
use vcp_core::config::VcpConfig;
use vcp_core::protocol;
use vcp_server::{AppState, Cli, Commands, ConfigAction, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("invalid configuration")?;

    match cli.command.clone().unwrap_or(Commands::Serve) {
        Commands::Serve => {
            logging::init(&config.logging)?;
            let state = AppState::build(config).await?;
            vcp_server::serve(state).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&redacted(config))?);
                Ok(())
            }
            ConfigAction::Check => {
                println!("ok");
                Ok(())
            }
        },
        Commands::Parse { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            let report = protocol::parse_with_diagnostics(&text);
            let diagnostics: Vec<String> = report.diagnostics.iter().map(ToString::to_string).collect();
            let output = serde_json::json!({
                "requests": report.requests,
                "diagnostics": diagnostics,
                "displayText": protocol::strip(&text),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

fn redacted(mut config: VcpConfig) -> VcpConfig {
    const MASK: &str = "********";
    if config.auth.api_key.is_some() {
        config.auth.api_key = Some(MASK.to_string());
    }
    if let Some(upstream) = config.chat.upstream.as_mut() {
        if upstream.api_key.is_some() {
            upstream.api_key = Some(MASK.to_string());
        }
    }
    config
}
