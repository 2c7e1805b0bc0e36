//! Request-scoped cancellation registry.
//!
//! The transport layer registers a token per request id and cancels it on
//! a supersede or an explicit cancel; providers polling the token return
//! the `Cancelled` sentinel instead of a partial answer.

use groovy_providers::CancellationToken;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct RequestTracker {
    active: Mutex<HashMap<u64, CancellationToken>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh token for a request id. Registering the same id
    /// again cancels the superseded request.
    pub fn begin(&self, id: u64) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.active.lock().insert(id, token.clone()) {
            previous.cancel();
        }
        token
    }

    pub fn cancel(&self, id: u64) {
        if let Some(token) = self.active.lock().get(&id) {
            token.cancel();
        }
    }

    pub fn finish(&self, id: u64) {
        self.active.lock().remove(&id);
    }

    /// Cancels everything in flight (shutdown, workspace invalidation).
    pub fn cancel_all(&self) {
        for token in self.active.lock().values() {
            token.cancel();
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}
