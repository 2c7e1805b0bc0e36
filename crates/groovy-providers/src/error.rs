//! Provider error taxonomy.
//!
//! Unresolvable queries are empty results, not errors; this type covers
//! structural misuse (typed, with a stable code) and cancellation. Nothing
//! here ever carries a stack trace to the caller.

use thiserror::Error;

/// Stable error codes surfaced with [`ProviderError::InvalidRequest`].
pub mod codes {
    pub const UNKNOWN_URI: &str = "request.unknown-uri";
    pub const INVALID_NAME: &str = "rename.invalid-name";
    pub const KEYWORD_NAME: &str = "rename.keyword-name";
    pub const TARGET_IN_DEPENDENCY: &str = "rename.target-in-dependency";
    pub const NOT_RENAMEABLE: &str = "rename.unresolved-target";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The request's cancellation signal fired; no partial answer exists.
    #[error("request cancelled")]
    Cancelled,
    /// Structural misuse of the interface: bad position, unknown document,
    /// invalid rename.
    #[error("{message}")]
    InvalidRequest {
        /// Stable machine-readable code from [`codes`].
        code: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn invalid(code: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest { code, message: message.into() }
    }
}

/// Cancellation signal shared between a request and its canceller.
///
/// Providers poll between files and between expensive phases; a fired
/// token makes the operation return [`ProviderError::Cancelled`] instead
/// of a partial answer.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, std::sync::atomic::Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Checkpoint helper: `Err(Cancelled)` once the signal fired.
    pub fn checkpoint(&self) -> Result<(), ProviderError> {
        if self.is_cancelled() { Err(ProviderError::Cancelled) } else { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_trips_after_cancel() {
        let token = CancellationToken::new();
        assert!(token.checkpoint().is_ok());
        token.cancel();
        assert_eq!(token.checkpoint(), Err(ProviderError::Cancelled));
        // Clones share the flag.
        let clone = token.clone();
        assert!(clone.is_cancelled());
    }
}
