//! Active request entries

use super::sink::ResponseSink;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// An externally-facing request that can be interrupted
pub struct ActiveRequest {
    pub request_id: String,
    pub cancellation_token: CancellationToken,
    pub response_sink: Arc<dyn ResponseSink>,
    pub is_streaming: bool,
    pub created_at: DateTime<Utc>,
    started: Instant,
    aborted: AtomicBool,
}

impl fmt::Debug for ActiveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRequest")
            .field("request_id", &self.request_id)
            .field("is_streaming", &self.is_streaming)
            .field("created_at", &self.created_at)
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

impl ActiveRequest {
    pub fn new(
        request_id: impl Into<String>,
        response_sink: Arc<dyn ResponseSink>,
        cancellation_token: CancellationToken,
        is_streaming: bool,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            cancellation_token,
            response_sink,
            is_streaming,
            created_at: Utc::now(),
            started: Instant::now(),
            aborted: AtomicBool::new(false),
        }
    }

    /// Time since registration
    pub fn age(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Set the aborted flag, returning false if it was already set
    pub(crate) fn mark_aborted(&self) -> bool {
        !self.aborted.swap(true, Ordering::AcqRel)
    }
}
