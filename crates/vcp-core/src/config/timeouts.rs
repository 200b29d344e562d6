//! Centralized timeout configuration
//!
//! Default timing values for the hub, the distributed router and the request
//! lifecycle registry. All of them can be overridden via configuration.

use std::time::Duration;

/// Default timing values for peer connections
pub mod hub {
    use super::*;

    /// Time a peer has to authenticate after connecting (10 seconds)
    pub const AUTH_SECS: u64 = 10;

    /// Interval between heartbeat pings (30 seconds)
    pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;

    /// Silence after which a peer is considered dead (60 seconds)
    pub const HEARTBEAT_TIMEOUT_SECS: u64 = 60;

    /// Get auth timeout as Duration
    pub fn auth_timeout() -> Duration {
        Duration::from_secs(AUTH_SECS)
    }

    /// Get heartbeat interval as Duration
    pub fn heartbeat_interval() -> Duration {
        Duration::from_secs(HEARTBEAT_INTERVAL_SECS)
    }

    /// Get heartbeat timeout as Duration
    pub fn heartbeat_timeout() -> Duration {
        Duration::from_secs(HEARTBEAT_TIMEOUT_SECS)
    }
}

/// Default timing values for remote tool calls
pub mod distributed {
    use super::*;

    /// Default timeout for a remote tool call (60 seconds)
    pub const CALL_SECS: u64 = 60;

    /// Worker silence before it is marked offline (90 seconds)
    pub const WORKER_HEARTBEAT_TIMEOUT_SECS: u64 = 90;

    /// Interval of the worker liveness sweep (30 seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 30;

    /// Get remote call timeout as Duration
    pub fn call_timeout() -> Duration {
        Duration::from_secs(CALL_SECS)
    }

    /// Get worker heartbeat timeout as Duration
    pub fn worker_heartbeat_timeout() -> Duration {
        Duration::from_secs(WORKER_HEARTBEAT_TIMEOUT_SECS)
    }

    /// Get worker sweep interval as Duration
    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }
}

/// Default timing values for active request tracking
pub mod lifecycle {
    use super::*;

    /// Maximum age of a tracked request (30 minutes)
    pub const REQUEST_TTL_SECS: u64 = 30 * 60;

    /// Interval of the stale-request sweep (60 seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 60;

    /// Get request TTL as Duration
    pub fn request_ttl() -> Duration {
        Duration::from_secs(REQUEST_TTL_SECS)
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }
}

/// Default timing values for local tools and the upstream model
pub mod tools {
    use super::*;

    /// Default timeout for a local stdio plugin (2 minutes)
    pub const STDIO_PLUGIN_SECS: u64 = 120;

    /// Default timeout for an upstream model request (5 minutes)
    pub const MODEL_REQUEST_SECS: u64 = 300;

    /// Get stdio plugin timeout as Duration
    pub fn stdio_plugin_timeout() -> Duration {
        Duration::from_secs(STDIO_PLUGIN_SECS)
    }

    /// Get model request timeout as Duration
    pub fn model_request_timeout() -> Duration {
        Duration::from_secs(MODEL_REQUEST_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_timeout_spans_two_intervals() {
        assert_eq!(hub::heartbeat_timeout(), hub::heartbeat_interval() * 2);
    }

    #[test]
    fn test_documented_defaults() {
        assert_eq!(hub::auth_timeout(), Duration::from_secs(10));
        assert_eq!(distributed::call_timeout(), Duration::from_secs(60));
        assert_eq!(lifecycle::request_ttl(), Duration::from_secs(1800));
    }
}
