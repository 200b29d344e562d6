use super::*;
use crate::config::{AuthConfig, HubConfig};
use crate::extensions::{Extension, ExtensionError, ExtensionResult, ExtensionState, LogForwarder};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

fn open_hub() -> MessageHub {
    MessageHub::new(AuthConfig::default(), HubConfig::default())
}

fn locked_hub() -> MessageHub {
    MessageHub::new(AuthConfig::with_key("secret"), HubConfig::default())
}

fn connect(hub: &MessageHub) -> (Uuid, UnboundedReceiver<OutboundFrame>) {
    let (transport, rx) = PeerTransport::channel();
    (hub.attach(transport), rx)
}

fn drain(rx: &mut UnboundedReceiver<OutboundFrame>) -> Vec<OutboundFrame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

fn texts(frames: &[OutboundFrame]) -> Vec<Value> {
    frames
        .iter()
        .filter_map(|frame| match frame {
            OutboundFrame::Text(text) => serde_json::from_str(text).ok(),
            _ => None,
        })
        .collect()
}

async fn authenticate(hub: &MessageHub, peer: Uuid, client_type: &str) {
    hub.handle_text(
        peer,
        &json!({"type": "auth", "apiKey": "secret", "clientType": client_type, "clientName": "test"})
            .to_string(),
    )
    .await;
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<Message>>,
}

#[async_trait]
impl Extension for Recorder {
    fn id(&self) -> &str {
        "recorder"
    }

    fn name(&self) -> &str {
        "Recorder"
    }

    async fn initialize(&self, _api: HubApi) -> ExtensionResult<()> {
        Ok(())
    }

    async fn on_message(&self, message: &Message) -> ExtensionResult<()> {
        self.seen.lock().push(message.clone());
        Ok(())
    }
}

struct Exploding;

#[async_trait]
impl Extension for Exploding {
    fn id(&self) -> &str {
        "exploding"
    }

    fn name(&self) -> &str {
        "Exploding"
    }

    async fn initialize(&self, _api: HubApi) -> ExtensionResult<()> {
        Ok(())
    }

    async fn on_message(&self, message: &Message) -> ExtensionResult<()> {
        if message.message_type == MessageType::from("boom") {
            panic!("extension blew up");
        }
        Err(ExtensionError::HandlerFailed {
            id: "exploding".into(),
            reason: "always fails".into(),
        })
    }
}

struct FailsToStart;

#[async_trait]
impl Extension for FailsToStart {
    fn id(&self) -> &str {
        "fails"
    }

    fn name(&self) -> &str {
        "Fails"
    }

    async fn initialize(&self, _api: HubApi) -> ExtensionResult<()> {
        Err(ExtensionError::Internal("no".into()))
    }

    async fn on_message(&self, _message: &Message) -> ExtensionResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_auth_gate_blocks_unauthenticated_messages() {
    let hub = locked_hub();
    let recorder = Arc::new(Recorder::default());
    hub.register_extension(recorder.clone()).await.unwrap();
    let (peer, mut rx) = connect(&hub);

    hub.handle_text(peer, r#"{"type":"register_tools","data":{}}"#).await;

    let frames = texts(&drain(&mut rx));
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "error");
    assert_eq!(frames[0]["code"], error_codes::NOT_AUTHENTICATED);
    assert!(recorder.seen.lock().is_empty());

    // ping is allowed before auth
    hub.handle_text(peer, r#"{"type":"ping"}"#).await;
    assert_eq!(texts(&drain(&mut rx))[0]["type"], "pong");
}

#[tokio::test]
async fn test_successful_auth() {
    let hub = locked_hub();
    let (peer, mut rx) = connect(&hub);

    hub.handle_text(
        peer,
        &json!({
            "type": "auth",
            "apiKey": "secret",
            "clientType": "VCPLog",
            "clientName": "viewer",
            "subscriptions": ["log"],
            "protocolVersion": "2"
        })
        .to_string(),
    )
    .await;

    let frames = texts(&drain(&mut rx));
    assert_eq!(frames[0]["type"], "auth_response");
    assert_eq!(frames[0]["success"], true);
    assert_eq!(frames[0]["clientId"], peer.to_string());

    let snapshot = &hub.list_peers()[0];
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.kind, PeerKind::Internal);
    assert_eq!(snapshot.display_name.as_deref(), Some("viewer"));
    assert_eq!(snapshot.protocol_version.as_deref(), Some("2"));
    assert_eq!(snapshot.subscriptions, vec!["log".to_string()]);
}

#[tokio::test]
async fn test_bad_key_closes_with_4003() {
    let hub = locked_hub();
    let (peer, mut rx) = connect(&hub);

    hub.handle_text(peer, r#"{"type":"auth","apiKey":"wrong"}"#).await;

    let frames = drain(&mut rx);
    let json = texts(&frames);
    assert_eq!(json[0]["success"], false);
    assert_eq!(json[0]["error"], "Invalid API key");
    assert!(frames.contains(&OutboundFrame::close(close_codes::AUTH_FAILED, "Authentication failed")));
    assert_eq!(hub.peer_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_auth_timeout_closes_with_4001() {
    let hub = locked_hub();
    let (_peer, mut rx) = connect(&hub);

    tokio::time::sleep(Duration::from_secs(11)).await;
    tokio::task::yield_now().await;

    let frames = drain(&mut rx);
    assert_eq!(texts(&frames)[0]["code"], error_codes::AUTH_TIMEOUT);
    assert!(frames.contains(&OutboundFrame::close(close_codes::AUTH_TIMEOUT, "Authentication timeout")));
    assert_eq!(hub.peer_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_authenticated_peer_survives_auth_window() {
    let hub = locked_hub();
    let (peer, _rx) = connect(&hub);
    authenticate(&hub, peer, "worker").await;

    tokio::time::sleep(Duration::from_secs(11)).await;
    tokio::task::yield_now().await;
    assert_eq!(hub.peer_count(), 1);
}

#[tokio::test]
async fn test_invalid_json_gets_error_frame() {
    let hub = open_hub();
    let (peer, mut rx) = connect(&hub);

    hub.handle_text(peer, "{not json").await;

    let frames = texts(&drain(&mut rx));
    assert_eq!(frames[0]["code"], error_codes::INVALID_MESSAGE);
    assert_eq!(hub.peer_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_evicts_silent_peer() {
    let hub = open_hub();
    let (silent, mut silent_rx) = connect(&hub);
    let (chatty, mut chatty_rx) = connect(&hub);

    tokio::time::advance(Duration::from_secs(40)).await;
    hub.handle_pong(chatty);
    tokio::time::advance(Duration::from_secs(21)).await;

    assert_eq!(hub.check_liveness().await, 1);
    assert!(drain(&mut silent_rx).contains(&OutboundFrame::close(
        close_codes::HEARTBEAT_TIMEOUT,
        "Heartbeat timeout"
    )));
    assert!(drain(&mut chatty_rx).contains(&OutboundFrame::Ping));

    let peers: Vec<Uuid> = hub.list_peers().iter().map(|p| p.id).collect();
    assert_eq!(peers, vec![chatty]);
    assert!(!peers.contains(&silent));

    let delivered = hub.broadcast(&Message::new(MessageType::Status, json!({}))).await;
    assert_eq!(delivered, 1);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_loop_runs_on_interval() {
    let hub = open_hub();
    let _task = hub.start();
    let (_peer, mut rx) = connect(&hub);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(drain(&mut rx).contains(&OutboundFrame::Ping));

    // no pongs: evicted on the tick after 60 s of silence
    tokio::time::sleep(Duration::from_secs(60)).await;
    tokio::task::yield_now().await;
    assert_eq!(hub.peer_count(), 0);

    hub.shutdown().await;
}

#[tokio::test]
async fn test_broadcast_filters() {
    let hub = locked_hub();
    let (internal, mut internal_rx) = connect(&hub);
    let (external, mut external_rx) = connect(&hub);
    let (_pending, mut pending_rx) = connect(&hub);
    authenticate(&hub, internal, "internal").await;
    authenticate(&hub, external, "worker").await;
    hub.handle_text(external, r#"{"type":"subscribe","data":{"types":["status"]}}"#).await;
    drain(&mut internal_rx);
    drain(&mut external_rx);

    let log = Message::new(MessageType::Log, json!({"line": 1}));
    assert_eq!(hub.broadcast(&log).await, 1);
    assert_eq!(texts(&drain(&mut internal_rx))[0]["type"], "log");
    assert!(drain(&mut external_rx).is_empty());
    assert!(drain(&mut pending_rx).is_empty());

    let status = Message::new(MessageType::Status, json!({})).with_targets([PeerKind::External]);
    assert_eq!(hub.broadcast(&status).await, 1);
    assert!(drain(&mut internal_rx).is_empty());

    assert_eq!(hub.send_to_kind(PeerKind::Internal, &Message::new(MessageType::Status, json!({}))).await, 1);

    hub.handle_text(external, r#"{"type":"unsubscribe","data":{"types":["status"]}}"#).await;
    assert_eq!(hub.broadcast(&log).await, 2);
}

#[tokio::test]
async fn test_failed_send_removes_peer() {
    let hub = open_hub();
    let (peer, rx) = connect(&hub);
    let recorder = Arc::new(Recorder::default());
    hub.register_extension(recorder.clone()).await.unwrap();
    drop(rx);

    assert_eq!(hub.broadcast(&Message::new(MessageType::Status, json!({}))).await, 0);
    assert_eq!(hub.peer_count(), 0);
    assert!(matches!(
        hub.send_to_peer(peer, &Message::new(MessageType::Status, json!({}))).await,
        Err(HubError::PeerNotFound(_))
    ));

    let seen = recorder.seen.lock();
    assert_eq!(seen[0].message_type, MessageType::PeerDisconnected);
    assert_eq!(seen[0].source_peer_id, Some(peer));
}

#[tokio::test]
async fn test_broadcast_drops_closed_connections_it_would_skip() {
    let hub = locked_hub();
    let (live, mut live_rx) = connect(&hub);
    let (_gone, gone_rx) = connect(&hub);
    authenticate(&hub, live, "internal").await;
    drain(&mut live_rx);
    drop(gone_rx);

    assert_eq!(hub.broadcast(&Message::new(MessageType::Log, json!({}))).await, 1);
    assert_eq!(hub.peer_count(), 1);
}

#[tokio::test]
async fn test_extension_failures_are_isolated() {
    let hub = open_hub();
    hub.register_extension(Arc::new(Exploding)).await.unwrap();
    let recorder = Arc::new(Recorder::default());
    hub.register_extension(recorder.clone()).await.unwrap();
    let (peer, mut rx) = connect(&hub);

    hub.handle_text(peer, r#"{"type":"boom","data":{"n":1}}"#).await;
    hub.handle_text(peer, r#"{"type":"custom","data":{"n":2}}"#).await;

    let seen = recorder.seen.lock();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].data["n"], 1);
    assert_eq!(seen[1].message_type, MessageType::Custom("custom".into()));
    assert!(drain(&mut rx).is_empty());
    assert_eq!(hub.peer_count(), 1);
}

#[tokio::test]
async fn test_extension_registry() {
    let hub = open_hub();
    hub.register_extension(Arc::new(Recorder::default())).await.unwrap();
    assert!(hub.register_extension(Arc::new(Recorder::default())).await.is_err());
    assert!(hub.register_extension(Arc::new(FailsToStart)).await.is_err());

    let extensions = hub.list_extensions();
    assert_eq!(extensions.len(), 1);
    assert_eq!(extensions[0].id, "recorder");
    assert_eq!(extensions[0].state, ExtensionState::Active);

    hub.unregister_extension("recorder").await.unwrap();
    assert!(hub.list_extensions().is_empty());
    assert!(hub.unregister_extension("recorder").await.is_err());
}

#[tokio::test]
async fn test_log_forwarder_relays_to_internal_peers() {
    let hub = locked_hub();
    let forwarder = Arc::new(LogForwarder::new());
    hub.register_extension(forwarder.clone()).await.unwrap();

    let (viewer, mut viewer_rx) = connect(&hub);
    let (worker, mut worker_rx) = connect(&hub);
    authenticate(&hub, viewer, "VCPLog").await;
    authenticate(&hub, worker, "worker").await;
    drain(&mut viewer_rx);
    drain(&mut worker_rx);

    hub.handle_text(worker, r#"{"type":"log","data":{"level":"info","text":"started"}}"#).await;

    let frames = texts(&drain(&mut viewer_rx));
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "log");
    assert_eq!(frames[0]["data"]["entry"]["text"], "started");
    assert_eq!(frames[0]["data"]["sourcePeerId"], worker.to_string());
    assert!(drain(&mut worker_rx).is_empty());
    assert_eq!(forwarder.forwarded(), 1);
}

#[tokio::test]
async fn test_shutdown_closes_peers_and_api() {
    let hub = open_hub();
    let api = hub.api();
    let (_peer, mut rx) = connect(&hub);

    hub.shutdown().await;

    assert!(drain(&mut rx).contains(&OutboundFrame::close(close_codes::GOING_AWAY, "Server shutting down")));
    assert_eq!(hub.peer_count(), 0);
    assert!(!api.is_alive());
    assert!(matches!(
        api.send_to_peer(Uuid::new_v4(), &Message::new(MessageType::Status, json!({}))).await,
        Err(HubError::HubClosed)
    ));
}

#[tokio::test]
async fn test_api_does_not_keep_hub_alive() {
    let api = {
        let hub = open_hub();
        hub.api()
    };
    assert!(!api.is_alive());
    assert_eq!(api.push_status(json!({})).await, 0);
    assert!(api.peers().is_empty());
}
