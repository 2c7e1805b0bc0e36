//! Parse requests and compile phases.

use serde::{Deserialize, Serialize};
use url::Url;

/// How deep the front end runs for one request.
///
/// Conversion parses and resolves local scopes, preserving source positions.
/// Later phases add cross-file class resolution and property
/// canonicalization; they cost more and only callers that need full type
/// information ask for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CompilePhase {
    #[default]
    Conversion,
    SemanticAnalysis,
    Canonicalization,
}

/// Everything one compile attempt needs.
///
/// `workspace_sources` carries the text of the other documents the resolver
/// may need for cross-file class references. `locator_candidates` lists the
/// path spellings under which the input's own declarations may be known
/// (URI/path disagreements between editors and build tools).
#[derive(Debug, Clone)]
pub struct ParseRequest {
    pub uri: Url,
    pub content: String,
    pub classpath: Vec<String>,
    pub source_roots: Vec<String>,
    pub workspace_sources: Vec<(Url, String)>,
    pub compile_phase: CompilePhase,
    pub locator_candidates: Vec<String>,
}

impl ParseRequest {
    pub fn new(uri: Url, content: impl Into<String>) -> Self {
        Self {
            uri,
            content: content.into(),
            classpath: Vec::new(),
            source_roots: Vec::new(),
            workspace_sources: Vec::new(),
            compile_phase: CompilePhase::default(),
            locator_candidates: Vec::new(),
        }
    }

    pub fn with_phase(mut self, phase: CompilePhase) -> Self {
        self.compile_phase = phase;
        self
    }

    pub fn with_workspace_sources(mut self, sources: Vec<(Url, String)>) -> Self {
        self.workspace_sources = sources;
        self
    }

    /// The simple name the script class takes when the file has loose
    /// statements: the last path segment, extension stripped, invalid
    /// identifier characters replaced.
    pub fn script_class_name(&self) -> String {
        let name = self
            .uri
            .path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap_or("script");
        let stem = name.split('.').next().unwrap_or("script");
        let cleaned: String = stem
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if cleaned.is_empty() { "script".to_string() } else { cleaned }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_test_support::must;

    #[test]
    fn script_class_name_strips_extension() {
        let req = ParseRequest::new(must(Url::parse("file:///src/My-Build.groovy")), "");
        assert_eq!(req.script_class_name(), "My_Build");
    }

    #[test]
    fn phase_ordering() {
        assert!(CompilePhase::Conversion < CompilePhase::SemanticAnalysis);
        assert!(CompilePhase::SemanticAnalysis < CompilePhase::Canonicalization);
    }
}
