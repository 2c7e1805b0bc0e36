//! Diagnostics merge layer.
//!
//! The parser's own diagnostics are unioned with whatever registered
//! external producers (linters, unused-import checks) report. Allowlist
//! and denylist govern which producers run: denylist membership wins,
//! then allowlist membership, then the producer's default-enabled flag.

use crate::error::{CancellationToken, ProviderError};
use groovy_compilation::ParseResult;
use groovy_parser::Diagnostic;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// An external diagnostic producer.
pub trait DiagnosticProvider: Send + Sync {
    /// Stable id used by allow/deny configuration.
    fn id(&self) -> &str;

    /// Whether the provider runs when configuration says nothing about it.
    fn default_enabled(&self) -> bool {
        true
    }

    fn provide(&self, uri: &Url, result: &ParseResult, text: &str) -> Vec<Diagnostic>;
}

/// Allow/deny configuration for diagnostic producers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticProviderConfig {
    pub denylist: HashSet<String>,
    pub allowlist: HashSet<String>,
}

impl DiagnosticProviderConfig {
    /// Denylist beats allowlist beats the default flag.
    pub fn is_enabled(&self, id: &str, default_enabled: bool) -> bool {
        if self.denylist.contains(id) {
            return false;
        }
        if self.allowlist.contains(id) {
            return true;
        }
        default_enabled
    }
}

/// Parser diagnostics unioned with every enabled provider's output. A
/// failing provider is logged and skipped; it never suppresses the others.
pub fn merged_diagnostics(
    providers: &[Arc<dyn DiagnosticProvider>],
    config: &DiagnosticProviderConfig,
    uri: &Url,
    result: &ParseResult,
    text: &str,
    token: &CancellationToken,
) -> Result<Vec<Diagnostic>, ProviderError> {
    token.checkpoint()?;
    let mut merged = result.diagnostics.clone();
    for provider in providers {
        token.checkpoint()?;
        if !config.is_enabled(provider.id(), provider.default_enabled()) {
            continue;
        }
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            provider.provide(uri, result, text)
        }));
        match outcome {
            Ok(extra) => merged.extend(extra),
            Err(_) => warn!(provider = provider.id(), %uri, "diagnostic provider failed"),
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_parser::{ParseRequest, Severity};
    use groovy_position::Range;
    use groovy_test_support::must;

    struct StaticProvider {
        id: String,
        default_enabled: bool,
        message: String,
    }

    impl DiagnosticProvider for StaticProvider {
        fn id(&self) -> &str {
            &self.id
        }

        fn default_enabled(&self) -> bool {
            self.default_enabled
        }

        fn provide(&self, _uri: &Url, _result: &ParseResult, _text: &str) -> Vec<Diagnostic> {
            vec![Diagnostic {
                range: Range::default(),
                severity: Severity::Warning,
                message: self.message.clone(),
                source: self.id.clone(),
                code: None,
            }]
        }
    }

    fn compiled(content: &str) -> (Url, ParseResult) {
        let uri = must(Url::parse("file:///d.groovy"));
        let result = groovy_compilation::compile(&ParseRequest::new(uri.clone(), content));
        (uri, result)
    }

    fn provider(id: &str, default_enabled: bool) -> Arc<dyn DiagnosticProvider> {
        Arc::new(StaticProvider {
            id: id.to_string(),
            default_enabled,
            message: format!("from {id}"),
        })
    }

    #[test]
    fn denylist_beats_allowlist_beats_default() {
        let (uri, result) = compiled("def x = 1\n");
        let providers =
            vec![provider("on", true), provider("off", false), provider("banned", true)];
        let config = DiagnosticProviderConfig {
            denylist: ["banned".to_string()].into(),
            allowlist: ["off".to_string(), "banned".to_string()].into(),
        };
        let merged = must(merged_diagnostics(
            &providers,
            &config,
            &uri,
            &result,
            "def x = 1\n",
            &CancellationToken::new(),
        ));
        let sources: Vec<&str> = merged.iter().map(|d| d.source.as_str()).collect();
        assert!(sources.contains(&"on"));
        assert!(sources.contains(&"off"), "allowlist overrides default-off");
        assert!(!sources.contains(&"banned"), "denylist wins over allowlist");
    }

    #[test]
    fn parser_diagnostics_always_present() {
        let (uri, result) = compiled("class {\n");
        let merged = must(merged_diagnostics(
            &[],
            &DiagnosticProviderConfig::default(),
            &uri,
            &result,
            "class {\n",
            &CancellationToken::new(),
        ));
        assert!(!merged.is_empty());
        assert!(merged.iter().all(|d| d.source == "groovyc"));
    }
}
