//! Hub message types and wire envelopes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Error codes carried by `{"type": "error"}` frames
pub mod error_codes {
    pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";
    pub const NOT_AUTHENTICATED: &str = "NOT_AUTHENTICATED";
    pub const AUTH_TIMEOUT: &str = "AUTH_TIMEOUT";
}

/// Message type tag
///
/// Unknown tags are kept verbatim in [`MessageType::Custom`] so extensions can
/// define their own message families.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    Auth,
    AuthResponse,
    Ping,
    Pong,
    Subscribe,
    Unsubscribe,
    Error,
    Log,
    Progress,
    Status,
    RegisterTools,
    WorkerHeartbeat,
    ExecuteTool,
    ToolResult,
    PeerDisconnected,
    Custom(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Auth => "auth",
            Self::AuthResponse => "auth_response",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Error => "error",
            Self::Log => "log",
            Self::Progress => "progress",
            Self::Status => "status",
            Self::RegisterTools => "register_tools",
            Self::WorkerHeartbeat => "worker_heartbeat",
            Self::ExecuteTool => "execute_tool",
            Self::ToolResult => "tool_result",
            Self::PeerDisconnected => "peer_disconnected",
            Self::Custom(tag) => tag,
        }
    }

    /// Types that bypass the authentication gate
    pub fn allowed_before_auth(&self) -> bool {
        matches!(self, Self::Auth | Self::Ping)
    }
}

impl From<String> for MessageType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "auth" => Self::Auth,
            "auth_response" => Self::AuthResponse,
            "ping" => Self::Ping,
            "pong" => Self::Pong,
            "subscribe" => Self::Subscribe,
            "unsubscribe" => Self::Unsubscribe,
            "error" => Self::Error,
            "log" => Self::Log,
            "progress" => Self::Progress,
            "status" => Self::Status,
            "register_tools" => Self::RegisterTools,
            "worker_heartbeat" => Self::WorkerHeartbeat,
            "execute_tool" => Self::ExecuteTool,
            "tool_result" => Self::ToolResult,
            "peer_disconnected" => Self::PeerDisconnected,
            _ => Self::Custom(tag),
        }
    }
}

impl From<&str> for MessageType {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<MessageType> for String {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Custom(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role a peer declared when authenticating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerKind {
    /// Not authenticated yet, or an unrecognized client type
    #[default]
    Unknown,
    /// Trusted in-house consumers such as log viewers and admin panels
    Internal,
    /// Remote workers and third-party clients
    External,
}

impl PeerKind {
    /// Map the `clientType` field of an auth frame
    pub fn from_client_type(client_type: &str) -> Self {
        match client_type.trim().to_ascii_lowercase().as_str() {
            "internal" | "log" | "vcplog" | "admin" => Self::Internal,
            "external" | "worker" | "distributed" | "distributedserver" => Self::External,
            _ => Self::Unknown,
        }
    }
}

/// A routed hub message
///
/// Built once and never mutated after it is handed to the hub; every
/// recipient receives its own serialized copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub message_type: MessageType,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
    /// Restrict delivery to these peer kinds
    pub target_kinds: Option<HashSet<PeerKind>>,
    /// Peer the message came from, `None` for hub-originated messages
    pub source_peer_id: Option<Uuid>,
}

impl Message {
    pub fn new(message_type: impl Into<MessageType>, data: Value) -> Self {
        Self {
            message_type: message_type.into(),
            data,
            timestamp: Utc::now(),
            target_kinds: None,
            source_peer_id: None,
        }
    }

    /// Only deliver to peers of the given kinds
    pub fn with_targets(mut self, kinds: impl IntoIterator<Item = PeerKind>) -> Self {
        self.target_kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Record the originating peer
    pub fn from_peer(mut self, peer_id: Uuid) -> Self {
        self.source_peer_id = Some(peer_id);
        self
    }

    /// Whether a peer of `kind` is an intended recipient
    pub fn targets(&self, kind: PeerKind) -> bool {
        self.target_kinds
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&kind))
    }

    /// Serialize for the wire: `{"type", "data", "timestamp"}`
    pub fn to_frame(&self) -> String {
        json!({
            "type": self.message_type,
            "data": self.data,
            "timestamp": self.timestamp.to_rfc3339(),
        })
        .to_string()
    }
}

/// Inbound frame as received from a peer
///
/// Payload fields may be nested under `data` or sent at the top level; both
/// shapes are accepted.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InboundEnvelope {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub data: Value,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl InboundEnvelope {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Payload: `data` when present, otherwise the top-level fields
    pub fn payload(&self) -> Value {
        if self.data.is_null() {
            Value::Object(self.rest.clone())
        } else {
            self.data.clone()
        }
    }

    /// Look a field up in `data` first, then at the top level
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name).or_else(|| self.rest.get(name))
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }
}

/// `{"type": "error", "code", "message"}`
pub(crate) fn error_frame(code: &str, message: &str) -> String {
    json!({
        "type": MessageType::Error,
        "code": code,
        "message": message,
        "timestamp": Utc::now().to_rfc3339(),
    })
    .to_string()
}

/// `{"type": "auth_response", "success", "clientId"?, "error"?}`
pub(crate) fn auth_response_frame(result: Result<Uuid, &str>) -> String {
    match result {
        Ok(client_id) => json!({
            "type": MessageType::AuthResponse,
            "success": true,
            "clientId": client_id,
        }),
        Err(error) => json!({
            "type": MessageType::AuthResponse,
            "success": false,
            "error": error,
        }),
    }
    .to_string()
}

pub(crate) fn pong_frame() -> String {
    json!({
        "type": MessageType::Pong,
        "timestamp": Utc::now().to_rfc3339(),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_round_trip() {
        for tag in ["auth", "tool_result", "peer_disconnected", "my_custom"] {
            let parsed = MessageType::from(tag);
            assert_eq!(parsed.as_str(), tag);
            assert_eq!(String::from(parsed), tag);
        }
        assert_eq!(MessageType::from("x"), MessageType::Custom("x".into()));
    }

    #[test]
    fn test_peer_kind_from_client_type() {
        assert_eq!(PeerKind::from_client_type("VCPLog"), PeerKind::Internal);
        assert_eq!(PeerKind::from_client_type("DistributedServer"), PeerKind::External);
        assert_eq!(PeerKind::from_client_type("browser"), PeerKind::Unknown);
    }

    #[test]
    fn test_envelope_accepts_nested_and_flat_payloads() {
        let nested = InboundEnvelope::parse(r#"{"type":"log","data":{"level":"info"}}"#).unwrap();
        assert_eq!(nested.message_type, MessageType::Log);
        assert_eq!(nested.payload()["level"], "info");

        let flat = InboundEnvelope::parse(r#"{"type":"auth","apiKey":"k","clientType":"worker"}"#).unwrap();
        assert_eq!(flat.str_field("apiKey"), Some("k"));
        assert_eq!(flat.payload()["clientType"], "worker");
    }

    #[test]
    fn test_envelope_requires_type() {
        assert!(InboundEnvelope::parse(r#"{"data":{}}"#).is_err());
        assert!(InboundEnvelope::parse("not json").is_err());
    }

    #[test]
    fn test_message_frame_and_targets() {
        let message = Message::new(MessageType::Status, json!({"ok": true}))
            .with_targets([PeerKind::Internal]);
        assert!(message.targets(PeerKind::Internal));
        assert!(!message.targets(PeerKind::External));

        let frame: Value = serde_json::from_str(&message.to_frame()).unwrap();
        assert_eq!(frame["type"], "status");
        assert_eq!(frame["data"]["ok"], true);
    }

    #[test]
    fn test_control_frames() {
        let id = Uuid::new_v4();
        let ok: Value = serde_json::from_str(&auth_response_frame(Ok(id))).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["clientId"], id.to_string());

        let err: Value = serde_json::from_str(&error_frame(error_codes::NOT_AUTHENTICATED, "no")).unwrap();
        assert_eq!(err["type"], "error");
        assert_eq!(err["code"], "NOT_AUTHENTICATED");
    }
}
