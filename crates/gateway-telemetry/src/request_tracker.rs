//! In-memory tracker of in-flight and recently completed requests, used by
//! the admin `/admin/stats` endpoint and debug logging. Not the source of
//! truth for billing — that's the usage ledger in `gateway-budget`.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Snapshot recorded when a request starts.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// Correlates with the `X-Request-Id` response header.
    pub request_id: String,
    /// Model requested.
    pub model: String,
    /// Whether this is a streaming request.
    pub streaming: bool,
    /// Provider the request was routed to, set once routing completes.
    pub provider: Option<String>,
    /// When the request was accepted.
    pub started_at: DateTime<Utc>,
}

impl RequestInfo {
    /// Start a new in-flight record.
    #[must_use]
    pub fn new(request_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            model: model.into(),
            streaming: false,
            provider: None,
            started_at: Utc::now(),
        }
    }

    /// Mark this request as streaming.
    #[must_use]
    pub const fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }
}

/// How a tracked request finished.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    /// Completed with a 2xx response.
    Success {
        /// Total wall-clock duration.
        duration_ms: u64,
    },
    /// Completed with a non-2xx response.
    Error {
        /// HTTP status code returned to the caller.
        status: u16,
        /// Operator-facing error message.
        message: String,
    },
}

/// An in-flight or recently completed request, as returned by
/// [`RequestTracker::snapshot`].
#[derive(Debug, Clone)]
pub struct TrackedRequest {
    /// The original start-of-request snapshot.
    pub info: RequestInfo,
    /// `None` while the request is still in flight.
    pub outcome: Option<RequestOutcome>,
}

/// Bounded ring of recently seen requests, indexed by request id.
///
/// Entries older than [`RequestTracker::MAX_ENTRIES`] are evicted
/// oldest-first as new ones arrive; this is a debugging aid, not an audit
/// log.
pub struct RequestTracker {
    inner: Mutex<Inner>,
}

struct Inner {
    order: std::collections::VecDeque<String>,
    entries: HashMap<String, TrackedRequest>,
}

impl RequestTracker {
    /// Maximum tracked requests retained at once.
    pub const MAX_ENTRIES: usize = 1000;

    /// Build an empty tracker wrapped in an `Arc` for sharing across
    /// handlers.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                order: std::collections::VecDeque::new(),
                entries: HashMap::new(),
            }),
        })
    }

    /// Record a request as starting.
    pub fn start(&self, info: RequestInfo) {
        let mut inner = self.inner.lock();
        let id = info.request_id.clone();
        if inner.entries.len() >= Self::MAX_ENTRIES {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        inner.order.push_back(id.clone());
        inner.entries.insert(id, TrackedRequest { info, outcome: None });
    }

    /// Attach the routed provider id to an in-flight request.
    pub fn update_provider(&self, request_id: &str, provider: &str) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get_mut(request_id) {
            entry.info.provider = Some(provider.to_string());
        }
    }

    /// Mark a request as failed.
    pub fn complete_error(&self, request_id: &str, status: u16, message: impl Into<String>) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get_mut(request_id) {
            entry.outcome = Some(RequestOutcome::Error {
                status,
                message: message.into(),
            });
        }
    }

    /// Mark a request as successfully completed.
    pub fn complete_success(&self, request_id: &str, duration_ms: u64) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get_mut(request_id) {
            entry.outcome = Some(RequestOutcome::Success { duration_ms });
        }
    }

    /// Snapshot every tracked request, most recently started first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TrackedRequest> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.entries.get(id).cloned())
            .collect()
    }

    /// Count of requests with no recorded outcome yet.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.entries.values().filter(|e| e.outcome.is_none()).count()
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                order: std::collections::VecDeque::new(),
                entries: HashMap::new(),
            }),
        }
    }
}
