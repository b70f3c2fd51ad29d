use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Identifies one analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    id: u64,
}

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Hands out monotonically increasing request ids. Only the most recent
/// request is current; results of older ones must be dropped.
///
/// `begin` and [`RequestTracker::run_if_current`] share a gate, so no request
/// can start between a currency check and the action it guards.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    current: Arc<AtomicU64>,
    gate: Arc<Mutex<()>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, making every earlier ticket stale.
    pub fn begin(&self) -> RequestTicket {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let id = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        RequestTicket { id }
    }

    /// Run `action` only if `ticket` is current, holding off new requests
    /// until it returns. `action` must not call [`RequestTracker::begin`].
    pub fn run_if_current<R>(&self, ticket: RequestTicket, action: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if self.current.load(Ordering::Acquire) == ticket.id {
            Some(action())
        } else {
            None
        }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.current.load(Ordering::Acquire) == ticket.id
    }

    pub fn current_id(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}
