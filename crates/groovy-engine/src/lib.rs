//! Embeddable Groovy analyzer engine.
//!
//! [`GroovyCore`] is the whole external surface: document lifecycle
//! (`open`/`edit`/`close`), the language queries of the provider layer,
//! and the configuration/workspace sideband. The LSP transport, build
//! tooling, and editor plumbing live outside and talk to this type only.

mod config;
mod documents;
mod engine;
mod error;
mod requests;

pub use config::{CompletionConfig, CoreConfig, DiagnosticProvidersConfig, JenkinsConfig};
pub use documents::{Document, DocumentStore};
pub use engine::{GroovyCore, GroovyCoreBuilder, WorkspaceChange};
pub use error::EngineError;
pub use requests::RequestTracker;

// Re-exported so embedders need only this crate for the common surface.
pub use groovy_parser::{CompilePhase, Diagnostic, Severity};
pub use groovy_position::{Position, Range};
pub use groovy_providers::{
    CancellationToken, CodeAction, CompletionItem, CompletionItemKind, DiagnosticProvider,
    DocumentSymbol, DocumentationProvider, FileRename, GdkProvider, Hover,
    JenkinsMetadataProvider, Location, QuickFixRegistry, SignatureHelp, SymbolKind, TextEdit,
    WorkspaceEdit, WorkspaceSymbol,
};
