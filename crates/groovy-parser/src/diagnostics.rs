//! Diagnostic value types shared across the pipeline.
//!
//! Ranges are editor coordinates (0-based, UTF-16); the parser converts at
//! the boundary so nothing downstream ever sees compiler coordinates.

use groovy_position::Range;
use serde::{Deserialize, Serialize};

/// Diagnostic severity, ordered most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub message: String,
    /// Producer id, e.g. `"groovyc"` for the parser itself.
    pub source: String,
    /// Stable machine-readable code, when one exists. Quick fixes key off
    /// this.
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: Severity::Error,
            message: message.into(),
            source: codes::SOURCE.to_string(),
            code: Some(codes::SYNTAX.to_string()),
        }
    }

    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: Severity::Warning,
            message: message.into(),
            source: codes::SOURCE.to_string(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }
}

/// Stable diagnostic codes emitted by the compilation pipeline.
pub mod codes {
    /// Producer id for the front end.
    pub const SOURCE: &str = "groovyc";
    /// Lexical or syntactic error.
    pub const SYNTAX: &str = "groovyc.syntax";
    /// Internal front-end fault; the synthetic (0,0) diagnostic.
    pub const INTERNAL: &str = "groovyc.internal";
    /// A class name that resolved against neither the workspace nor the
    /// default imports.
    pub const UNRESOLVED_CLASS: &str = "groovyc.unresolved.class";
    /// Compile exceeded the soft timeout; surfaced as a warning.
    pub const COMPILE_TIMEOUT: &str = "groovyc.timeout";
}
