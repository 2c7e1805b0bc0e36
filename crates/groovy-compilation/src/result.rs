//! The parse-result value object: everything one compile attempt produced.

use groovy_analysis::{ModuleVisit, SymbolIndex};
use groovy_ast::ModuleAst;
use groovy_parser::{CompilePhase, Diagnostic};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Opaque handle describing how the compile ran; kept for callers that
/// later want deeper phases or timing data.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// Phase the front end actually reached.
    pub phase: CompilePhase,
    /// Fingerprint of the compiled content.
    pub fingerprint: u64,
    /// Wall-clock cost of the compile.
    pub elapsed: Duration,
}

/// Output of one compile attempt on one document.
///
/// Invariant: `ast`, `visit`, and `index` are either all present or all
/// absent — a usable syntax tree always comes with its relationship maps
/// and symbol index, built before the result becomes visible to any
/// reader.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub uri: Url,
    pub ast: Option<Arc<ModuleAst>>,
    /// Always present, possibly empty; ordered as produced.
    pub diagnostics: Vec<Diagnostic>,
    pub visit: Option<Arc<ModuleVisit>>,
    pub index: Option<Arc<SymbolIndex>>,
    pub unit: CompilationUnit,
}

impl ParseResult {
    /// True when the compile produced a queryable program model.
    pub fn has_ast(&self) -> bool {
        self.ast.is_some()
    }

    /// The (ast, visit, index) triple, present together per the struct
    /// invariant.
    pub fn model(&self) -> Option<(&Arc<ModuleAst>, &Arc<ModuleVisit>, &Arc<SymbolIndex>)> {
        match (&self.ast, &self.visit, &self.index) {
            (Some(ast), Some(visit), Some(index)) => Some((ast, visit, index)),
            _ => None,
        }
    }
}
