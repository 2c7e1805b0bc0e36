//! The compile pipeline: parse → track relationships → index symbols.

use crate::result::{CompilationUnit, ParseResult};
use groovy_analysis::{ClassCatalog, build_index, visit_module};
use groovy_parser::{Diagnostic, ParseRequest, codes};
use groovy_position::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Compiles beyond this take the previous result's place late enough that a
/// user-visible note is warranted.
pub const DEFAULT_SOFT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the full pipeline for one request. Infallible like the parser
/// facade: the result always carries diagnostics, and the model triple is
/// present exactly when an AST was recovered.
pub fn compile(request: &ParseRequest) -> ParseResult {
    compile_with_timeout(request, DEFAULT_SOFT_TIMEOUT)
}

pub fn compile_with_timeout(request: &ParseRequest, soft_timeout: Duration) -> ParseResult {
    let started = Instant::now();
    let parsed = groovy_parser::parse(request);
    let fingerprint = crate::cache::fingerprint(&request.content);

    let mut diagnostics = parsed.diagnostics;
    let (ast, visit, index) = match parsed.ast {
        Some(ast) => {
            let ast = Arc::new(ast);
            let visit = Arc::new(visit_module(request.uri.clone(), &ast));

            // Catalog: this module plus every workspace source, parsed at
            // conversion with no further workspace context of their own.
            let mut catalog = ClassCatalog::new();
            catalog.add_module(&request.uri, &ast);
            for (uri, content) in &request.workspace_sources {
                let neighbor = ParseRequest::new(uri.clone(), content.clone());
                if let Some(neighbor_ast) = groovy_parser::parse(&neighbor).ast {
                    catalog.add_module(uri, &neighbor_ast);
                }
            }

            let index = Arc::new(build_index(&request.uri, &ast, &visit, &catalog));
            (Some(ast), Some(visit), Some(index))
        }
        None => (None, None, None),
    };

    let elapsed = started.elapsed();
    if elapsed > soft_timeout {
        warn!(uri = %request.uri, ?elapsed, "compile exceeded soft timeout");
        diagnostics.push(
            Diagnostic::warning(
                Range::default(),
                format!("compilation took {}ms, exceeding the soft timeout", elapsed.as_millis()),
            )
            .with_code(codes::COMPILE_TIMEOUT),
        );
    }

    ParseResult {
        uri: request.uri.clone(),
        ast,
        diagnostics,
        visit,
        index,
        unit: CompilationUnit { phase: request.compile_phase, fingerprint, elapsed },
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use groovy_test_support::must;
    use url::Url;

    #[test]
    fn model_triple_is_all_or_nothing() {
        let req = ParseRequest::new(must(Url::parse("file:///p.groovy")), "def a = 1\n");
        let result = compile(&req);
        assert!(result.has_ast());
        assert!(result.model().is_some());
        assert_eq!(result.unit.fingerprint, crate::cache::fingerprint("def a = 1\n"));
    }

    #[test]
    fn every_indexed_node_is_reachable_from_the_ast() {
        let req = ParseRequest::new(
            must(Url::parse("file:///p.groovy")),
            "class A { def f(x) { x + 1 } }\ndef a = new A()\na.f(2)\n",
        );
        let result = compile(&req);
        let Some((ast, visit, _)) = result.model() else {
            panic!("expected a model");
        };
        for id in &visit.nodes {
            assert!(ast.get(*id).is_some());
        }
    }
}
