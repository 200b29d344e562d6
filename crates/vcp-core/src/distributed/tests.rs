use super::*;
use crate::config::{AuthConfig, DistributedConfig, HubConfig};
use crate::hub::{MessageHub, OutboundFrame, PeerTransport};
use crate::tools::{RemoteToolProvider, ToolArgs};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

async fn setup() -> (MessageHub, Arc<DistributedRouter>) {
    let hub = MessageHub::new(AuthConfig::default(), HubConfig::default());
    let router = Arc::new(DistributedRouter::new(DistributedConfig::default()));
    hub.register_extension(router.clone()).await.unwrap();
    (hub, router)
}

async fn connect_worker(
    hub: &MessageHub,
    name: &str,
    tools: &[&str],
) -> (Uuid, UnboundedReceiver<OutboundFrame>) {
    let (transport, rx) = PeerTransport::channel();
    let peer = hub.attach(transport);
    let tools: Vec<Value> = tools
        .iter()
        .map(|name| json!({"name": name, "description": format!("{} tool", name)}))
        .collect();
    hub.handle_text(
        peer,
        &json!({"type": "register_tools", "data": {"serverName": name, "tools": tools}}).to_string(),
    )
    .await;
    (peer, rx)
}

async fn next_call(rx: &mut UnboundedReceiver<OutboundFrame>) -> Value {
    loop {
        match rx.recv().await {
            Some(OutboundFrame::Text(text)) => {
                let frame: Value = serde_json::from_str(&text).unwrap();
                if frame["type"] == "execute_tool" {
                    return frame["data"].clone();
                }
            }
            Some(_) => continue,
            None => panic!("worker transport closed"),
        }
    }
}

fn args(pairs: &[(&str, &str)]) -> ToolArgs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_remote_call_round_trip() {
    let (hub, router) = setup().await;
    let (worker, mut rx) = connect_worker(&hub, "search-box", &["search"]).await;
    assert!(router.has_remote_tool("search"));

    let call = {
        let router = router.clone();
        tokio::spawn(async move {
            router
                .call_remote_tool("search", &args(&[("query", "rust")]), Duration::from_secs(5))
                .await
        })
    };

    let request = next_call(&mut rx).await;
    assert_eq!(request["toolName"], "search");
    assert_eq!(request["toolArgs"]["query"], "rust");
    assert_eq!(router.pending_count(), 1);

    hub.handle_text(
        worker,
        &json!({
            "type": "tool_result",
            "data": {"requestId": request["requestId"], "status": "success", "result": {"hits": 3}}
        })
        .to_string(),
    )
    .await;

    let result = call.await.unwrap();
    assert!(result.is_success());
    assert_eq!(result.payload(), Some(&json!({"hits": 3})));
    assert_eq!(router.pending_count(), 0);
}

#[tokio::test]
async fn test_reply_from_another_peer_is_ignored() {
    let (hub, router) = setup().await;
    let (worker, mut rx) = connect_worker(&hub, "search-box", &["search"]).await;
    let (intruder, _intruder_rx) = connect_worker(&hub, "other", &["lookup"]).await;

    let call = {
        let router = router.clone();
        tokio::spawn(async move {
            router
                .call_remote_tool("search", &ToolArgs::new(), Duration::from_secs(5))
                .await
        })
    };
    let request = next_call(&mut rx).await;

    let reply = |result: &str| {
        json!({
            "type": "tool_result",
            "data": {"requestId": request["requestId"], "status": "success", "result": result}
        })
        .to_string()
    };
    hub.handle_text(intruder, &reply("forged")).await;
    assert_eq!(router.pending_count(), 1);

    hub.handle_text(worker, &reply("genuine")).await;
    let result = call.await.unwrap();
    assert_eq!(result.payload(), Some(&json!("genuine")));
    assert_eq!(router.pending_count(), 0);
}

#[tokio::test]
async fn test_remote_error_reply_becomes_failed_result() {
    let (hub, router) = setup().await;
    let (worker, mut rx) = connect_worker(&hub, "w", &["search"]).await;

    let call = {
        let router = router.clone();
        tokio::spawn(async move {
            router
                .call_remote_tool("search", &ToolArgs::new(), Duration::from_secs(5))
                .await
        })
    };
    let request = next_call(&mut rx).await;
    hub.handle_text(
        worker,
        &json!({
            "type": "tool_result",
            "data": {"requestId": request["requestId"], "status": "error", "error": "index offline"}
        })
        .to_string(),
    )
    .await;

    let result = call.await.unwrap();
    assert!(!result.is_success());
    assert_eq!(result.error(), Some("index offline"));
}

#[tokio::test]
async fn test_unknown_tool_fails_fast() {
    let (_hub, router) = setup().await;

    let result = router
        .call_remote_tool("missing", &ToolArgs::new(), Duration::from_secs(5))
        .await;

    assert!(!result.is_success());
    assert_eq!(result.error(), Some("Tool not found: missing"));
    assert_eq!(router.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_removes_pending_call_and_keeps_worker() {
    let (hub, router) = setup().await;
    let (_worker, mut rx) = connect_worker(&hub, "slow", &["crunch"]).await;

    let call = {
        let router = router.clone();
        tokio::spawn(async move {
            router
                .call_remote_tool("crunch", &ToolArgs::new(), Duration::from_millis(500))
                .await
        })
    };
    let _request = next_call(&mut rx).await;
    assert_eq!(router.pending_count(), 1);

    let result = call.await.unwrap();
    assert!(!result.is_success());
    assert_eq!(
        result.error(),
        Some("Remote call to 'crunch' timed out after 500 ms")
    );
    assert_eq!(router.pending_count(), 0);

    let workers = router.list_workers();
    assert_eq!(workers.len(), 1);
    assert_eq!(workers[0].status, WorkerStatus::Online);
}

#[tokio::test(start_paused = true)]
async fn test_late_reply_after_timeout_is_ignored() {
    let (hub, router) = setup().await;
    let (worker, mut rx) = connect_worker(&hub, "slow", &["crunch"]).await;

    let call = {
        let router = router.clone();
        tokio::spawn(async move {
            router
                .call_remote_tool("crunch", &ToolArgs::new(), Duration::from_millis(100))
                .await
        })
    };
    let request = next_call(&mut rx).await;
    let result = call.await.unwrap();
    assert!(!result.is_success());

    hub.handle_text(
        worker,
        &json!({"type": "tool_result", "data": {"requestId": request["requestId"], "status": "success"}})
            .to_string(),
    )
    .await;
    assert_eq!(router.pending_count(), 0);
}

#[tokio::test]
async fn test_disconnect_marks_offline_and_fails_pending() {
    let (hub, router) = setup().await;
    let (worker, mut rx) = connect_worker(&hub, "flaky", &["search"]).await;

    let call = {
        let router = router.clone();
        tokio::spawn(async move {
            router
                .call_remote_tool("search", &ToolArgs::new(), Duration::from_secs(30))
                .await
        })
    };
    let _request = next_call(&mut rx).await;

    hub.detach(worker).await;

    let result = call.await.unwrap();
    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("disconnected"));
    assert_eq!(router.pending_count(), 0);

    let workers = router.list_workers();
    assert_eq!(workers[0].status, WorkerStatus::Offline);
    assert!(!router.has_remote_tool("search"));
    assert!(router.remote_tools().is_empty());
}

#[tokio::test]
async fn test_newest_registration_wins() {
    let (hub, router) = setup().await;
    let (_first, _rx1) = connect_worker(&hub, "first", &["search", "fetch"]).await;
    let (second, _rx2) = connect_worker(&hub, "second", &["search"]).await;

    let tools = router.list_remote_tools();
    let names: Vec<&str> = tools.iter().map(|t| t.tool.name.as_str()).collect();
    assert_eq!(names, vec!["fetch", "search"]);
    let search = tools.iter().find(|t| t.tool.name == "search").unwrap();
    assert_eq!(search.worker_id, second);
    assert_eq!(search.worker_name, "second");
}

#[tokio::test]
async fn test_unregister_worker() {
    let (hub, router) = setup().await;
    let (worker, _rx) = connect_worker(&hub, "w", &["search"]).await;

    assert!(router.unregister_worker(worker));
    assert!(!router.unregister_worker(worker));
    assert!(router.list_workers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sweep_marks_silent_workers_offline() {
    let (hub, router) = setup().await;
    let (worker, _rx) = connect_worker(&hub, "w", &["search"]).await;
    let timeout = router.config().worker_heartbeat_timeout;

    tokio::time::advance(timeout / 2).await;
    hub.handle_text(worker, r#"{"type":"worker_heartbeat","data":{}}"#)
        .await;
    tokio::time::advance(timeout / 2 + Duration::from_secs(1)).await;
    assert_eq!(router.sweep_workers(), 0);

    tokio::time::advance(timeout).await;
    assert_eq!(router.sweep_workers(), 1);
    assert!(!router.has_remote_tool("search"));

    // any traffic brings it back
    hub.handle_text(worker, r#"{"type":"worker_heartbeat","data":{}}"#)
        .await;
    assert!(router.has_remote_tool("search"));
}

#[tokio::test]
async fn test_cancelled_call_removes_pending_entry() {
    let (hub, router) = setup().await;
    let (_worker, mut rx) = connect_worker(&hub, "w", &["search"]).await;
    let cancel = CancellationToken::new();

    let call = {
        let router = router.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            router
                .call_remote_tool_cancellable(
                    "search",
                    &ToolArgs::new(),
                    Duration::from_secs(30),
                    &cancel,
                )
                .await
        })
    };
    let _request = next_call(&mut rx).await;
    cancel.cancel();

    let result = call.await.unwrap();
    assert_eq!(result.error(), Some("Request was cancelled"));
    assert_eq!(router.pending_count(), 0);
}

#[tokio::test]
async fn test_call_before_registration_with_hub_fails() {
    let router = DistributedRouter::new(DistributedConfig::default());
    let result = router
        .call_remote_tool("search", &ToolArgs::new(), Duration::from_secs(1))
        .await;
    assert!(!result.is_success());
}
