//! Engine-level error taxonomy.
//!
//! Parse failures never appear here — they are diagnostics. Unresolvable
//! queries are empty results. What remains is structural misuse
//! (`InvalidRequest`), cancellation, and internal faults, each with a
//! stable code and no stack trace on the wire.

use groovy_providers::ProviderError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The request's cancellation signal fired; no partial answer was
    /// produced.
    #[error("request cancelled")]
    Cancelled,
    /// Position out of range, unknown URI, rename into a dependency,
    /// invalid new name.
    #[error("{message}")]
    InvalidRequest { code: String, message: String },
    /// Unexpected engine failure. The affected document's cache entry has
    /// been invalidated; `id` is stable for support correlation.
    #[error("internal error ({id})")]
    Internal { id: String },
}

impl EngineError {
    pub fn unknown_uri(uri: &url::Url) -> Self {
        Self::InvalidRequest {
            code: groovy_providers::error_codes::UNKNOWN_URI.to_string(),
            message: format!("no open document for {uri}"),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &str {
        match self {
            Self::Cancelled => "request.cancelled",
            Self::InvalidRequest { code, .. } => code,
            Self::Internal { .. } => "engine.internal",
        }
    }
}

impl From<ProviderError> for EngineError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Cancelled => Self::Cancelled,
            ProviderError::InvalidRequest { code, message } => {
                Self::InvalidRequest { code: code.to_string(), message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_test_support::must;

    #[test]
    fn provider_errors_map_with_codes() {
        let err: EngineError =
            ProviderError::invalid(groovy_providers::error_codes::INVALID_NAME, "bad").into();
        assert_eq!(err.code(), "rename.invalid-name");
        let cancelled: EngineError = ProviderError::Cancelled.into();
        assert_eq!(cancelled, EngineError::Cancelled);
        let unknown = EngineError::unknown_uri(&must(url::Url::parse("file:///x.groovy")));
        assert_eq!(unknown.code(), "request.unknown-uri");
    }
}
