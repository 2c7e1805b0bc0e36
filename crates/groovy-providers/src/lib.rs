//! Language query providers for the Groovy analyzer core.
//!
//! Each provider is one externally visible operation — completion,
//! definition, references, rename, hover, document symbols, workspace
//! symbols, signature help, diagnostics merge, code actions — composed
//! from the compilation cache and the symbol index. Providers are pure
//! readers: they never mutate cached state, and every operation takes a
//! cancellation token it polls between files and between expensive
//! phases.

mod code_actions;
mod completion;
mod definition;
mod diagnostics;
mod error;
mod gdk;
mod hover;
mod items;
mod jenkins;
mod references;
mod rename;
mod resolve;
mod signature_help;
mod symbols_provider;

pub use code_actions::{FixContext, QuickFixRegistry};
pub use completion::{
    COMPLETION_SENTINEL, CompletionProvider, DEFAULT_TYPE_PARAMETER_LIMIT,
};
pub use definition::definition;
pub use diagnostics::{DiagnosticProvider, DiagnosticProviderConfig, merged_diagnostics};
pub use error::{CancellationToken, ProviderError, codes as error_codes};
pub use gdk::{DefaultGdkProvider, GdkMethod, GdkProvider};
pub use hover::{DocumentationProvider, GroovydocProvider, hover, signature_of};
pub use items::{
    CodeAction, CompletionItem, CompletionItemKind, DocumentSymbol, FileRename, Hover, Location,
    SignatureHelp, SignatureInformation, SymbolKind, TextEdit, WorkspaceEdit, WorkspaceSymbol,
};
pub use jenkins::{
    DEFAULT_JENKINS_PATTERNS, JenkinsFileClassifier, JenkinsGlobal, JenkinsMetadataProvider,
    JenkinsStepParameter, NoJenkinsMetadata,
};
pub use references::{collect_reference_locations, references};
pub use rename::rename;
pub use resolve::{WorkspaceView, catalog_from_cache, declaration_for, resolve_at};
pub use signature_help::signature_help;
pub use symbols_provider::{WORKSPACE_SYMBOL_LIMIT, document_symbols, workspace_symbols};
