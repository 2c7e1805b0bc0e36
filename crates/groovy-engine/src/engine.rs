//! The engine facade: document lifecycle in, language queries out.
//!
//! One [`GroovyCore`] owns the compilation cache, the open-document store,
//! and the injected provider instances. There are no process-wide
//! singletons — loggers, metadata registries, and configuration all arrive
//! through the constructor or [`GroovyCore::configure`].
//!
//! Compiles for one URI serialize inside the cache; queries read immutable
//! `Arc` snapshots, so a query that raced an edit finishes against the
//! result it started with. On open and edit every open document is
//! recompiled with the others as workspace sources, keeping cross-file
//! reference edges consistent before any query runs.

use crate::config::CoreConfig;
use crate::documents::DocumentStore;
use crate::error::EngineError;
use crate::requests::RequestTracker;
use groovy_compilation::{CacheStats, CompilationCache, ParseResult};
use groovy_parser::{Diagnostic, ParseRequest};
use groovy_position::{Position, Range};
use groovy_providers::{
    CancellationToken, CodeAction, CompletionItem, CompletionProvider, DefaultGdkProvider,
    DiagnosticProvider, DiagnosticProviderConfig, DocumentSymbol, DocumentationProvider,
    GdkProvider, GroovydocProvider, Hover, JenkinsFileClassifier, JenkinsMetadataProvider,
    Location, NoJenkinsMetadata, ProviderError, QuickFixRegistry, SignatureHelp, WorkspaceEdit,
    WorkspaceSymbol, WorkspaceView,
};
use parking_lot::RwLock;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

/// Coarse invalidation event from the build-system collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceChange {
    /// Classpath or source roots changed; every cached result is stale.
    All,
    /// Only the named documents are stale.
    Documents(Vec<Url>),
}

pub struct GroovyCoreBuilder {
    config: CoreConfig,
    gdk: Arc<dyn GdkProvider>,
    jenkins: Arc<dyn JenkinsMetadataProvider>,
    doc_providers: Vec<Arc<dyn DocumentationProvider>>,
    diag_providers: Vec<Arc<dyn DiagnosticProvider>>,
    fixes: QuickFixRegistry,
    workspace_root: Option<Url>,
    classpath: Vec<Url>,
}

impl GroovyCoreBuilder {
    pub fn with_config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_gdk(mut self, gdk: Arc<dyn GdkProvider>) -> Self {
        self.gdk = gdk;
        self
    }

    pub fn with_jenkins(mut self, jenkins: Arc<dyn JenkinsMetadataProvider>) -> Self {
        self.jenkins = jenkins;
        self
    }

    pub fn with_documentation_provider(
        mut self,
        provider: Arc<dyn DocumentationProvider>,
    ) -> Self {
        self.doc_providers.push(provider);
        self
    }

    pub fn with_diagnostic_provider(mut self, provider: Arc<dyn DiagnosticProvider>) -> Self {
        self.diag_providers.push(provider);
        self
    }

    pub fn with_quick_fixes(mut self, fixes: QuickFixRegistry) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn with_workspace_root(mut self, root: Url) -> Self {
        self.workspace_root = Some(root);
        self
    }

    pub fn with_classpath_entry(mut self, entry: Url) -> Self {
        self.classpath.push(entry);
        self
    }

    pub fn build(self) -> GroovyCore {
        let classifier = classifier_from(&self.config);
        let completion = CompletionProvider::new(Arc::clone(&self.gdk))
            .with_jenkins(Arc::clone(&self.jenkins), classifier)
            .with_type_parameter_limit(self.config.completion.type_parameter_limit);
        GroovyCore {
            cache: CompilationCache::new(self.config.max_cached_documents),
            completion: RwLock::new(completion),
            config: RwLock::new(self.config),
            documents: RwLock::new(DocumentStore::default()),
            gdk: self.gdk,
            jenkins: self.jenkins,
            doc_providers: self.doc_providers,
            diag_providers: self.diag_providers,
            fixes: self.fixes,
            workspace: RwLock::new(WorkspaceView {
                root: self.workspace_root,
                classpath: self.classpath,
            }),
            requests: RequestTracker::new(),
        }
    }
}

fn classifier_from(config: &CoreConfig) -> JenkinsFileClassifier {
    match JenkinsFileClassifier::from_patterns(&config.jenkins.file_patterns) {
        Ok(classifier) => classifier,
        Err(err) => {
            warn!(%err, "invalid jenkins.file_patterns, keeping defaults");
            JenkinsFileClassifier::default_patterns()
        }
    }
}

pub struct GroovyCore {
    config: RwLock<CoreConfig>,
    documents: RwLock<DocumentStore>,
    cache: CompilationCache,
    completion: RwLock<CompletionProvider>,
    gdk: Arc<dyn GdkProvider>,
    jenkins: Arc<dyn JenkinsMetadataProvider>,
    doc_providers: Vec<Arc<dyn DocumentationProvider>>,
    diag_providers: Vec<Arc<dyn DiagnosticProvider>>,
    fixes: QuickFixRegistry,
    workspace: RwLock<WorkspaceView>,
    requests: RequestTracker,
}

impl Default for GroovyCore {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GroovyCore {
    pub fn builder() -> GroovyCoreBuilder {
        GroovyCoreBuilder {
            config: CoreConfig::default(),
            gdk: Arc::new(DefaultGdkProvider),
            jenkins: Arc::new(NoJenkinsMetadata),
            doc_providers: vec![Arc::new(GroovydocProvider)],
            diag_providers: Vec::new(),
            fixes: QuickFixRegistry::with_builtin_rules(),
            workspace_root: None,
            classpath: Vec::new(),
        }
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Per-request cancellation registry for the transport wrapper.
    pub fn requests(&self) -> &RequestTracker {
        &self.requests
    }

    pub fn cache_statistics(&self) -> CacheStats {
        self.cache.statistics()
    }

    // ------------------------------------------------------------------
    // document lifecycle
    // ------------------------------------------------------------------

    /// Opens (or replaces) a document and recompiles the open set.
    /// Returns the merged diagnostics for the opened document.
    pub fn open(&self, uri: &Url, text: &str, version: i32) -> Vec<Diagnostic> {
        self.documents.write().open(uri.clone(), text.to_string(), version);
        self.recompile_open_documents();
        self.current_diagnostics(uri)
    }

    /// Applies an edit; stale versions are ignored and answered from the
    /// last accepted text.
    pub fn edit(&self, uri: &Url, text: &str, version: i32) -> Vec<Diagnostic> {
        let accepted = self.documents.write().edit(uri, text.to_string(), version);
        if accepted {
            self.recompile_open_documents();
        }
        self.current_diagnostics(uri)
    }

    pub fn close(&self, uri: &Url) {
        self.documents.write().close(uri);
        self.cache.invalidate(uri);
        info!(%uri, "closed document");
    }

    fn parse_request_for(&self, uri: &Url, text: String) -> ParseRequest {
        let workspace = self.workspace.read();
        let mut request = ParseRequest::new(uri.clone(), text)
            .with_phase(self.config.read().compile_phase)
            .with_workspace_sources(self.documents.read().sources_excluding(uri));
        request.classpath =
            workspace.classpath.iter().map(|entry| entry.to_string()).collect();
        request.locator_candidates = vec![uri.path().to_string()];
        request
    }

    fn recompile_open_documents(&self) {
        let uris = self.documents.read().uris();
        for uri in uris {
            let Some(text) = self.documents.read().get(&uri).map(|d| d.text.clone()) else {
                continue;
            };
            let request = self.parse_request_for(&uri, text);
            // Never answer from the cache here: unchanged documents still
            // need fresh cross-file edges against the changed neighbor.
            self.cache.recompile(&request);
        }
    }

    /// The latest parse result for a URI, compiling on a cache miss.
    fn result_for(&self, uri: &Url) -> Result<Arc<ParseResult>, EngineError> {
        let Some(text) = self.documents.read().get(uri).map(|d| d.text.clone()) else {
            // Not open; answer from the cache when it still holds an entry.
            return self.cache.get_any(uri).ok_or_else(|| EngineError::unknown_uri(uri));
        };
        if let Some(result) = self.cache.get(uri, &text) {
            return Ok(result);
        }
        Ok(self.cache.compile(&self.parse_request_for(uri, text)))
    }

    fn current_diagnostics(&self, uri: &Url) -> Vec<Diagnostic> {
        match self.diagnostics(uri, &CancellationToken::new()) {
            Ok(diagnostics) => diagnostics,
            Err(_) => Vec::new(),
        }
    }

    /// Runs a provider body with internal-fault isolation: a panic is
    /// logged, invalidates the document's cache entry, and surfaces as a
    /// generic internal error.
    fn guarded<T>(
        &self,
        uri: &Url,
        body: impl FnOnce() -> Result<T, ProviderError>,
    ) -> Result<T, EngineError> {
        match catch_unwind(AssertUnwindSafe(body)) {
            Ok(outcome) => outcome.map_err(EngineError::from),
            Err(_) => {
                error!(%uri, "provider panicked; invalidating cache entry");
                self.cache.invalidate(uri);
                Err(EngineError::Internal { id: "engine.internal".to_string() })
            }
        }
    }

    // ------------------------------------------------------------------
    // queries
    // ------------------------------------------------------------------

    pub fn completion(
        &self,
        uri: &Url,
        position: Position,
        token: &CancellationToken,
    ) -> Result<Vec<CompletionItem>, EngineError> {
        let Some(text) = self.documents.read().get(uri).map(|d| d.text.clone()) else {
            return Err(EngineError::unknown_uri(uri));
        };
        let sources = self.documents.read().sources_excluding(uri);
        self.guarded(uri, || {
            self.completion.read().complete(&self.cache, uri, position, &text, &sources, token)
        })
    }

    pub fn definition(
        &self,
        uri: &Url,
        position: Position,
        token: &CancellationToken,
    ) -> Result<Vec<Location>, EngineError> {
        self.result_for(uri)?;
        let workspace = self.workspace.read().clone();
        self.guarded(uri, || {
            groovy_providers::definition(&self.cache, &workspace, uri, position, token)
        })
    }

    pub fn references(
        &self,
        uri: &Url,
        position: Position,
        include_declaration: bool,
        token: &CancellationToken,
    ) -> Result<Vec<Location>, EngineError> {
        self.result_for(uri)?;
        self.guarded(uri, || {
            groovy_providers::references(&self.cache, uri, position, include_declaration, token)
        })
    }

    pub fn rename(
        &self,
        uri: &Url,
        position: Position,
        new_name: &str,
        token: &CancellationToken,
    ) -> Result<WorkspaceEdit, EngineError> {
        self.result_for(uri)?;
        let workspace = self.workspace.read().clone();
        self.guarded(uri, || {
            groovy_providers::rename(&self.cache, &workspace, uri, position, new_name, token)
        })
    }

    pub fn hover(
        &self,
        uri: &Url,
        position: Position,
        token: &CancellationToken,
    ) -> Result<Option<Hover>, EngineError> {
        self.result_for(uri)?;
        self.guarded(uri, || {
            groovy_providers::hover(
                &self.cache,
                &self.doc_providers,
                uri,
                position,
                |wanted| self.documents.read().get(wanted).map(|d| d.text.clone()),
                token,
            )
        })
    }

    pub fn document_symbols(
        &self,
        uri: &Url,
        token: &CancellationToken,
    ) -> Result<Vec<DocumentSymbol>, EngineError> {
        self.result_for(uri)?;
        self.guarded(uri, || groovy_providers::document_symbols(&self.cache, uri, token))
    }

    pub fn workspace_symbols(
        &self,
        query: &str,
        token: &CancellationToken,
    ) -> Result<Vec<WorkspaceSymbol>, EngineError> {
        match catch_unwind(AssertUnwindSafe(|| {
            groovy_providers::workspace_symbols(&self.cache, query, token)
        })) {
            Ok(outcome) => outcome.map_err(EngineError::from),
            Err(_) => Err(EngineError::Internal { id: "engine.internal".to_string() }),
        }
    }

    pub fn signature_help(
        &self,
        uri: &Url,
        position: Position,
        token: &CancellationToken,
    ) -> Result<Option<SignatureHelp>, EngineError> {
        self.result_for(uri)?;
        self.guarded(uri, || groovy_providers::signature_help(&self.cache, uri, position, token))
    }

    /// The merge layer: parser diagnostics unioned with registered
    /// external providers, gated by allow/deny configuration.
    pub fn diagnostics(
        &self,
        uri: &Url,
        token: &CancellationToken,
    ) -> Result<Vec<Diagnostic>, EngineError> {
        let result = self.result_for(uri)?;
        let text = self
            .documents
            .read()
            .get(uri)
            .map(|d| d.text.clone())
            .unwrap_or_default();
        let config = self.config.read();
        let provider_config = DiagnosticProviderConfig {
            denylist: config.diagnostic_providers.denylist.clone(),
            allowlist: config.diagnostic_providers.allowlist.clone(),
        };
        drop(config);
        self.guarded(uri, || {
            groovy_providers::merged_diagnostics(
                &self.diag_providers,
                &provider_config,
                uri,
                &result,
                &text,
                token,
            )
        })
    }

    pub fn code_actions(
        &self,
        uri: &Url,
        range: Range,
        diagnostics: &[Diagnostic],
        token: &CancellationToken,
    ) -> Result<Vec<CodeAction>, EngineError> {
        let Some(text) = self.documents.read().get(uri).map(|d| d.text.clone()) else {
            return Err(EngineError::unknown_uri(uri));
        };
        self.guarded(uri, || {
            self.fixes.actions(&self.cache, uri, &text, range, diagnostics, token)
        })
    }

    // ------------------------------------------------------------------
    // sideband
    // ------------------------------------------------------------------

    pub fn configure(&self, config: CoreConfig) {
        self.cache.set_capacity(config.max_cached_documents);
        let classifier = classifier_from(&config);
        *self.completion.write() = CompletionProvider::new(Arc::clone(&self.gdk))
            .with_jenkins(Arc::clone(&self.jenkins), classifier)
            .with_type_parameter_limit(config.completion.type_parameter_limit);
        *self.config.write() = config;
        info!("engine reconfigured");
    }

    /// Coarse invalidation from the build-system collaborator. In-flight
    /// requests are cancelled; open documents recompile against the new
    /// workspace state.
    pub fn on_workspace_change(&self, change: WorkspaceChange) {
        self.requests.cancel_all();
        match change {
            WorkspaceChange::All => self.cache.clear(),
            WorkspaceChange::Documents(uris) => {
                for uri in &uris {
                    self.cache.invalidate(uri);
                }
            }
        }
        self.recompile_open_documents();
    }

    pub fn set_workspace_root(&self, root: Option<Url>) {
        self.workspace.write().root = root;
    }
}
