//! WebSocket driver for hub peers
//!
//! Each connection gets a [`PeerTransport`]; a writer task drains the hub's
//! outbound frames onto the socket while the reader feeds inbound frames
//! back into the hub.

use crate::app::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use vcp_core::hub::{MessageHub, OutboundFrame, PeerTransport};

/// `GET <hub path>`: upgrade to a hub connection
///
/// Authentication happens in-band, so this route is not behind the HTTP key check.
pub async fn hub_upgrade(State(state): State<AppState>, upgrade: WebSocketUpgrade) -> Response {
    let hub = state.hub.clone();
    upgrade.on_upgrade(move |socket| drive(hub, socket))
}

async fn drive(hub: MessageHub, socket: WebSocket) {
    let (transport, mut outbound) = PeerTransport::channel();
    let peer_id = hub.attach(transport);
    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let (message, last) = match frame {
                OutboundFrame::Text(text) => (Message::Text(text.into()), false),
                OutboundFrame::Ping => (Message::Ping(Bytes::new()), false),
                OutboundFrame::Close { code, reason } => (
                    Message::Close(Some(CloseFrame {
                        code,
                        reason: reason.into(),
                    })),
                    true,
                ),
            };
            if sink.send(message).await.is_err() || last {
                break;
            }
        }
        let _ = sink.close().await;
    });

    loop {
        let inbound = tokio::select! {
            inbound = stream.next() => inbound,
            _ = &mut writer => break,
        };
        match inbound {
            Some(Ok(Message::Text(text))) => hub.handle_text(peer_id, text.as_str()).await,
            Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                Ok(text) => hub.handle_text(peer_id, text).await,
                Err(_) => tracing::debug!(peer = %peer_id, "ignoring non-utf8 binary frame"),
            },
            Some(Ok(Message::Pong(_))) | Some(Ok(Message::Ping(_))) => hub.handle_pong(peer_id),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                tracing::debug!(peer = %peer_id, error = %e, "websocket read failed");
                break;
            }
        }
    }

    hub.detach(peer_id).await;
    writer.abort();
}
