//! Engine configuration.
//!
//! One `CoreConfig` carries every recognized option; embedders deserialize
//! it from whatever settings channel they have and pass it whole. There
//! are no process-wide settings objects — configuration reaches the engine
//! only through [`crate::GroovyCore::configure`].

use groovy_parser::CompilePhase;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_max_cached_documents() -> usize {
    groovy_compilation::DEFAULT_CAPACITY
}

fn default_type_parameter_limit() -> usize {
    groovy_providers::DEFAULT_TYPE_PARAMETER_LIMIT
}

fn default_jenkins_patterns() -> Vec<String> {
    groovy_providers::DEFAULT_JENKINS_PATTERNS.iter().map(|s| s.to_string()).collect()
}

/// Allow/deny switches for registered diagnostic providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticProvidersConfig {
    #[serde(default)]
    pub denylist: HashSet<String>,
    #[serde(default)]
    pub allowlist: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JenkinsConfig {
    /// Glob patterns classifying a URI as a Jenkins pipeline file.
    #[serde(default = "default_jenkins_patterns")]
    pub file_patterns: Vec<String>,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self { file_patterns: default_jenkins_patterns() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Cap on type-parameter candidate lists.
    #[serde(default = "default_type_parameter_limit")]
    pub type_parameter_limit: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self { type_parameter_limit: default_type_parameter_limit() }
    }
}

/// All recognized engine options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Compilation cache capacity.
    pub max_cached_documents: usize,
    /// How deep compiles run by default.
    pub compile_phase: CompilePhase,
    pub diagnostic_providers: DiagnosticProvidersConfig,
    pub jenkins: JenkinsConfig,
    pub completion: CompletionConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_cached_documents: default_max_cached_documents(),
            compile_phase: CompilePhase::Conversion,
            diagnostic_providers: DiagnosticProvidersConfig::default(),
            jenkins: JenkinsConfig::default(),
            completion: CompletionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_test_support::must;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_stable() {
        let config = CoreConfig::default();
        assert_eq!(config.max_cached_documents, 100);
        assert_eq!(config.compile_phase, CompilePhase::Conversion);
        assert_eq!(config.completion.type_parameter_limit, 20);
        assert!(!config.jenkins.file_patterns.is_empty());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: CoreConfig = must(serde_json::from_str(
            r#"{
                "max_cached_documents": 5,
                "compile_phase": "semantic-analysis",
                "diagnostic_providers": { "denylist": ["lint"] }
            }"#,
        ));
        assert_eq!(config.max_cached_documents, 5);
        assert_eq!(config.compile_phase, CompilePhase::SemanticAnalysis);
        assert!(config.diagnostic_providers.denylist.contains("lint"));
        // Unspecified sections keep their defaults.
        assert_eq!(config.completion.type_parameter_limit, 20);
    }
}
