//! File-based configuration loading

use super::model::VcpConfig;
use crate::error::{VcpError, VcpResult};
use std::fs;
use std::path::Path;

/// Load configuration from a file
///
/// Supports TOML and JSON formats based on file extension.
/// Returns default config if file doesn't exist.
pub fn load_from_file(path: &Path) -> VcpResult<VcpConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(VcpConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        VcpError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config: VcpConfig = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| {
            VcpError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
        _ => toml::from_str(&content).map_err(|e| {
            VcpError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("vcp.toml");
        fs::write(
            &config_path,
            r#"
            [server]
            port = 7000

            [auth]
            required = true
            api_key = "secret"

            [distributed]
            call_timeout = "5s"

            [[tools.stdio]]
            name = "HelloWorld"
            command = "python"
            args = ["plugins/hello/main.py"]
            "#,
        )
        .unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.server.port, 7000);
        assert!(config.auth.required);
        assert_eq!(config.distributed.call_timeout, Duration::from_secs(5));
        assert_eq!(config.tools.stdio.len(), 1);
        assert_eq!(config.tools.stdio[0].timeout, Duration::from_secs(120));
        assert!(config.tools.builtin_time);
    }

    #[test]
    fn test_load_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("vcp.json");
        fs::write(
            &config_path,
            r#"{ "hub": { "path": "/ws", "auth_timeout": "3s" }, "logging": { "format": "json" } }"#,
        )
        .unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.hub.path, "/ws");
        assert_eq!(config.hub.auth_timeout, Duration::from_secs(3));
        assert_eq!(config.hub.heartbeat_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_from_file(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 6005);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[server\nport = ").unwrap();

        let err = load_from_file(&config_path).unwrap_err();
        assert!(matches!(err, VcpError::Config { .. }));
    }
}
