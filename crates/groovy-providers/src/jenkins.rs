//! Jenkins pipeline metadata: abstract provider plus file classification.
//!
//! The core knows nothing about Jenkins itself — an injected provider
//! supplies global variables and step parameter tables, and a glob-based
//! classifier decides which URIs count as pipeline files.

use globset::{Glob, GlobSet, GlobSetBuilder};
use url::Url;

/// A Jenkins global variable (`env`, `params`, `currentBuild`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JenkinsGlobal {
    pub name: String,
    pub type_name: String,
    pub documentation: Option<String>,
}

/// A keyword-style argument of a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JenkinsStepParameter {
    pub name: String,
    pub type_name: String,
    pub documentation: Option<String>,
}

/// Metadata source queried by completion for Jenkins files.
pub trait JenkinsMetadataProvider: Send + Sync {
    fn global_variables(&self) -> Vec<JenkinsGlobal>;
    /// Map-key parameters of a step invocation, by step name.
    fn step_parameters(&self, step: &str) -> Vec<JenkinsStepParameter>;
}

/// The default provider: no metadata, no add-ons.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJenkinsMetadata;

impl JenkinsMetadataProvider for NoJenkinsMetadata {
    fn global_variables(&self) -> Vec<JenkinsGlobal> {
        Vec::new()
    }

    fn step_parameters(&self, _step: &str) -> Vec<JenkinsStepParameter> {
        Vec::new()
    }
}

/// Glob patterns deciding whether a URI is a Jenkins pipeline file.
pub const DEFAULT_JENKINS_PATTERNS: &[&str] =
    &["**/Jenkinsfile", "**/Jenkinsfile.*", "**/*.jenkinsfile", "**/vars/*.groovy"];

#[derive(Debug, Clone)]
pub struct JenkinsFileClassifier {
    set: GlobSet,
}

impl JenkinsFileClassifier {
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(Self { set: builder.build()? })
    }

    pub fn default_patterns() -> Self {
        // The defaults are valid globs; an empty set is the safe fallback
        // if that ever stops holding.
        Self::from_patterns(DEFAULT_JENKINS_PATTERNS)
            .unwrap_or(Self { set: GlobSet::empty() })
    }

    pub fn is_jenkins_file(&self, uri: &Url) -> bool {
        self.set.is_match(uri.path())
    }
}

impl Default for JenkinsFileClassifier {
    fn default() -> Self {
        Self::default_patterns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_test_support::must;

    #[test]
    fn default_patterns_classify_jenkinsfiles() {
        let classifier = JenkinsFileClassifier::default_patterns();
        assert!(classifier.is_jenkins_file(&must(Url::parse("file:///repo/Jenkinsfile"))));
        assert!(classifier.is_jenkins_file(&must(Url::parse("file:///repo/ci/deploy.jenkinsfile"))));
        assert!(classifier.is_jenkins_file(&must(Url::parse("file:///lib/vars/buildApp.groovy"))));
        assert!(!classifier.is_jenkins_file(&must(Url::parse("file:///src/Main.groovy"))));
    }

    #[test]
    fn custom_patterns_override() {
        let classifier = must(JenkinsFileClassifier::from_patterns(&["**/pipelines/*.groovy"]));
        assert!(classifier.is_jenkins_file(&must(Url::parse("file:///x/pipelines/a.groovy"))));
        assert!(!classifier.is_jenkins_file(&must(Url::parse("file:///x/Jenkinsfile"))));
    }
}
