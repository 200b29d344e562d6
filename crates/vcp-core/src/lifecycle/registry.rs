//! Registry of in-flight requests

use super::frames::{DONE_FRAME, interrupt_chunk, interrupt_completion, sse_data};
use super::request::ActiveRequest;
use super::sink::{Finale, ResponseSink};
use crate::config::LifecycleConfig;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Result of [`RequestRegistry::interrupt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptOutcome {
    /// The request was found, cancelled and its response finalized
    Interrupted,
    /// No such request (unknown, finished or already interrupted)
    NotFound,
}

impl InterruptOutcome {
    pub fn is_interrupted(self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

/// Tracks every externally-facing request so it can be interrupted
///
/// Entries are removed on completion ([`unregister`](Self::unregister) or a
/// dropped [`RequestGuard`]), on interrupt, or by the TTL sweep.
pub struct RequestRegistry {
    config: LifecycleConfig,
    requests: DashMap<String, ActiveRequest>,
}

impl RequestRegistry {
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            requests: DashMap::new(),
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Track a request; an existing entry with the same id is replaced
    pub fn register(
        &self,
        request_id: impl Into<String>,
        sink: Arc<dyn ResponseSink>,
        token: CancellationToken,
        is_streaming: bool,
    ) {
        let request = ActiveRequest::new(request_id, sink, token, is_streaming);
        let request_id = request.request_id.clone();
        if self.requests.insert(request_id.clone(), request).is_some() {
            tracing::warn!(request_id = %request_id, "replaced active request with the same id");
        }
        tracing::debug!(request_id = %request_id, is_streaming, "request registered");
    }

    /// Like [`register`](Self::register), returning a guard that unregisters on drop
    pub fn register_guarded(
        self: &Arc<Self>,
        request_id: impl Into<String>,
        sink: Arc<dyn ResponseSink>,
        token: CancellationToken,
        is_streaming: bool,
    ) -> RequestGuard {
        let request_id = request_id.into();
        self.register(request_id.clone(), sink, token, is_streaming);
        RequestGuard {
            registry: Arc::downgrade(self),
            request_id,
        }
    }

    /// Abort a request and close its response
    ///
    /// The entry is removed before anything else happens, so concurrent or
    /// repeated calls for the same id finalize the response at most once.
    #[tracing::instrument(skip(self))]
    pub async fn interrupt(&self, request_id: &str) -> InterruptOutcome {
        let Some((_, request)) = self.requests.remove(request_id) else {
            tracing::debug!("interrupt for unknown request");
            return InterruptOutcome::NotFound;
        };
        if !request.mark_aborted() {
            return InterruptOutcome::NotFound;
        }

        request.cancellation_token.cancel();

        // let the request task observe cancellation before the sink is touched
        tokio::task::yield_now().await;

        finalize(&request).await;
        tracing::info!(
            age_ms = request.age().as_millis() as u64,
            streaming = request.is_streaming,
            "request interrupted"
        );
        InterruptOutcome::Interrupted
    }

    /// Stop tracking a finished request
    pub fn unregister(&self, request_id: &str) -> bool {
        let removed = self.requests.remove(request_id).is_some();
        if removed {
            tracing::debug!(request_id = %request_id, "request unregistered");
        }
        removed
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.requests.contains_key(request_id)
    }

    /// Cancellation token of a tracked request
    pub fn cancellation_token(&self, request_id: &str) -> Option<CancellationToken> {
        self.requests
            .get(request_id)
            .map(|request| request.cancellation_token.clone())
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Drop entries older than `request_ttl`, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        let ttl = self.config.request_ttl;
        let before = self.requests.len();
        self.requests.retain(|request_id, request| {
            let keep = request.age() <= ttl;
            if !keep {
                tracing::warn!(request_id = %request_id, "dropping request past its TTL");
            }
            keep
        });
        before.saturating_sub(self.requests.len())
    }

    /// Run [`sweep_expired`](Self::sweep_expired) every `sweep_interval` until `shutdown` fires
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let registry: Weak<Self> = Arc::downgrade(self);
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown.cancelled() => break,
                }
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let removed = registry.sweep_expired();
                if removed > 0 {
                    tracing::info!(removed, remaining = registry.len(), "request TTL sweep");
                }
            }
            tracing::debug!("request sweeper stopped");
        })
    }
}

async fn finalize(request: &ActiveRequest) {
    let finale = if request.is_streaming {
        Finale::Frames(vec![
            sse_data(&interrupt_chunk(&request.request_id)),
            DONE_FRAME.to_string(),
        ])
    } else {
        Finale::Json(interrupt_completion(&request.request_id))
    };

    if !request.response_sink.finish_once(finale).await {
        tracing::debug!(request_id = %request.request_id, "response already finalized");
    }
}

/// Unregisters its request when dropped
#[must_use = "dropping the guard unregisters the request immediately"]
pub struct RequestGuard {
    registry: Weak<RequestRegistry>,
    request_id: String,
}

impl RequestGuard {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(&self.request_id);
        }
    }
}
