//! Environment variable overrides
//!
//! Variables use the `VCP_` prefix. Overrides are applied on top of whatever
//! the file source produced.

use super::model::{UpstreamConfig, VcpConfig};
use super::timeouts;
use crate::error::{VcpError, VcpResult};

/// Apply overrides from the process environment
pub fn apply_env_overrides(config: &mut VcpConfig) -> VcpResult<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary lookup (the process environment in production)
pub fn apply_overrides<F>(config: &mut VcpConfig, lookup: F) -> VcpResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("VCP_HOST") {
        config.server.host = host;
    }

    if let Some(port) = lookup("VCP_PORT") {
        config.server.port = port
            .parse()
            .map_err(|_| VcpError::config(format!("Invalid VCP_PORT value: {}", port)))?;
    }

    if let Some(key) = lookup("VCP_API_KEY") {
        config.auth.api_key = Some(key);
        config.auth.required = true;
    }

    if let Some(required) = lookup("VCP_AUTH_REQUIRED") {
        config.auth.required = parse_bool(&required).ok_or_else(|| {
            VcpError::config(format!("Invalid VCP_AUTH_REQUIRED value: {}", required))
        })?;
    }

    if let Some(level) = lookup("VCP_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Some(base_url) = lookup("VCP_UPSTREAM_URL") {
        let upstream = config.chat.upstream.get_or_insert_with(|| UpstreamConfig {
            base_url: String::new(),
            api_key: None,
            model: None,
            timeout: timeouts::tools::model_request_timeout(),
        });
        upstream.base_url = base_url;
    }

    if let Some(upstream) = config.chat.upstream.as_mut() {
        if let Some(key) = lookup("VCP_UPSTREAM_API_KEY") {
            upstream.api_key = Some(key);
        }
        if let Some(model) = lookup("VCP_UPSTREAM_MODEL") {
            upstream.model = Some(model);
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_api_key_enables_auth() {
        let mut config = VcpConfig::default();
        apply_overrides(&mut config, lookup_from(&[("VCP_API_KEY", "k1")])).unwrap();
        assert!(config.auth.required);
        assert_eq!(config.auth.api_key.as_deref(), Some("k1"));
    }

    #[test]
    fn test_explicit_auth_flag_wins() {
        let mut config = VcpConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[("VCP_API_KEY", "k1"), ("VCP_AUTH_REQUIRED", "off")]),
        )
        .unwrap();
        assert!(!config.auth.required);
    }

    #[test]
    fn test_invalid_port() {
        let mut config = VcpConfig::default();
        let result = apply_overrides(&mut config, lookup_from(&[("VCP_PORT", "http")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_upstream_created_from_env() {
        let mut config = VcpConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("VCP_UPSTREAM_URL", "http://localhost:3000"),
                ("VCP_UPSTREAM_MODEL", "gpt-4o"),
            ]),
        )
        .unwrap();

        let upstream = config.chat.upstream.unwrap();
        assert_eq!(upstream.base_url, "http://localhost:3000");
        assert_eq!(upstream.model.as_deref(), Some("gpt-4o"));
    }
}
