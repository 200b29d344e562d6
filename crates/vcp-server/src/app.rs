//! Application state and router assembly

use crate::{auth, routes, ws};
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vcp_core::chat::{ModelBackend, OpenAiBackend, ToolLoop};
use vcp_core::config::VcpConfig;
use vcp_core::distributed::DistributedRouter;
use vcp_core::error::VcpResult;
use vcp_core::extensions::LogForwarder;
use vcp_core::hub::MessageHub;
use vcp_core::lifecycle::RequestRegistry;
use vcp_core::tools::{ToolDispatcher, registry_from_config};

/// Long-lived services shared by every handler
///
/// Built once at startup; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<VcpConfig>,
    pub hub: MessageHub,
    pub router: Arc<DistributedRouter>,
    pub requests: Arc<RequestRegistry>,
    pub dispatcher: ToolDispatcher,
    pub tool_loop: Option<ToolLoop>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire up the hub, its extensions, local tools and the chat loop
    pub async fn build(config: VcpConfig) -> VcpResult<Self> {
        let hub = MessageHub::new(config.auth.clone(), config.hub.clone());

        let router = Arc::new(DistributedRouter::new(config.distributed.clone()));
        hub.register_extension(router.clone()).await?;
        hub.register_extension(Arc::new(LogForwarder::new())).await?;

        let registry = registry_from_config(&config.tools);
        tracing::info!(tools = ?registry.tool_names(), "local tools registered");
        let dispatcher = ToolDispatcher::new(Arc::new(registry)).with_remote(router.clone());

        let tool_loop = match &config.chat.upstream {
            Some(upstream) => {
                let backend = OpenAiBackend::new(upstream.clone())?;
                tracing::info!(url = %backend.url(), "chat upstream configured");
                Some(ToolLoop::new(
                    Arc::new(backend),
                    dispatcher.clone(),
                    config.chat.max_tool_rounds,
                ))
            }
            None => None,
        };

        Ok(Self {
            requests: Arc::new(RequestRegistry::new(config.lifecycle.clone())),
            config: Arc::new(config),
            hub,
            router,
            dispatcher,
            tool_loop,
            started_at: Utc::now(),
        })
    }

    /// Replace the chat model backend
    pub fn with_backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.tool_loop = Some(ToolLoop::new(
            backend,
            self.dispatcher.clone(),
            self.config.chat.max_tool_rounds,
        ));
        self
    }

    /// Start the hub heartbeat and the worker and request sweepers
    pub fn start_background(&self) -> Vec<JoinHandle<()>> {
        let shutdown = self.hub.shutdown_token();
        vec![
            self.hub.start(),
            self.router.spawn_sweeper(shutdown.clone()),
            self.requests.spawn_sweeper(shutdown),
        ]
    }

    /// Close every peer and stop background work
    pub async fn shutdown(&self) {
        self.hub.shutdown().await;
    }
}

/// Build the HTTP router
pub fn build_router(state: AppState) -> Router {
    let control = Router::new()
        .route("/interrupt", post(routes::interrupt::interrupt))
        .route("/tool", post(routes::tool::call_tool))
        .route("/status", get(routes::status::status))
        .route("/distributed/tools", get(routes::distributed::list_tools))
        .route("/distributed/call", post(routes::distributed::call_tool))
        .route("/v1/chat/completions", post(routes::chat::chat_completions))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route(&state.config.hub.path, get(ws::hub_upgrade))
        .merge(control)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
