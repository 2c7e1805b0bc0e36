//! The parse facade: one infallible entry point from request to parsed
//! module.

use crate::budget::ParseBudget;
use crate::diagnostics::{Diagnostic, Severity, codes};
use crate::parser::{ParsedModule, Parser};
use crate::request::{CompilePhase, ParseRequest};
use crate::resolver::resolve_scopes;
use groovy_lexer::TokenKind;
use groovy_position::Range;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, warn};

/// Classes resolvable without any workspace context: the default imports
/// every Groovy compilation unit gets (java.lang, java.util, java.io,
/// groovy.lang essentials).
const DEFAULT_CLASSES: &[&str] = &[
    "ArrayList",
    "BigDecimal",
    "BigInteger",
    "Boolean",
    "Byte",
    "Character",
    "Class",
    "Closure",
    "Collection",
    "Comparable",
    "Date",
    "Double",
    "Exception",
    "File",
    "Float",
    "HashMap",
    "HashSet",
    "Integer",
    "Iterable",
    "LinkedHashMap",
    "LinkedList",
    "List",
    "Long",
    "Map",
    "Math",
    "Number",
    "Object",
    "Pattern",
    "Runnable",
    "RuntimeException",
    "Script",
    "Set",
    "Short",
    "String",
    "StringBuilder",
    "System",
    "Thread",
    "Throwable",
];

/// Runs the front end for one request. Never fails: lexical and syntactic
/// problems surface as diagnostics, and an internal fault degrades to a
/// single synthetic error at (0,0) with the ast absent.
pub fn parse(request: &ParseRequest) -> ParsedModule {
    let outcome = catch_unwind(AssertUnwindSafe(|| parse_inner(request)));
    match outcome {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(uri = %request.uri, "internal front-end fault during parse");
            ParsedModule {
                ast: None,
                diagnostics: vec![Diagnostic {
                    range: Range::default(),
                    severity: Severity::Error,
                    message: "internal error while compiling this file".to_string(),
                    source: codes::SOURCE.to_string(),
                    code: Some(codes::INTERNAL.to_string()),
                }],
            }
        }
    }
}

fn parse_inner(request: &ParseRequest) -> ParsedModule {
    let script_name = request.script_class_name();
    let parser = Parser::new(&request.content, &script_name, ParseBudget::default());
    let mut parsed = parser.parse();
    debug!(
        uri = %request.uri,
        diagnostics = parsed.diagnostics.len(),
        phase = ?request.compile_phase,
        "parsed module"
    );

    if let Some(ast) = parsed.ast.as_mut() {
        let report = resolve_scopes(ast);
        if request.compile_phase >= CompilePhase::SemanticAnalysis {
            let known = known_class_names(request, ast);
            let mut flagged = HashSet::new();
            for (name, node) in report.class_like {
                if known.contains(name.as_str()) || !flagged.insert(name.clone()) {
                    continue;
                }
                if let Some(range) = ast.range(node).to_editor() {
                    parsed.diagnostics.push(
                        Diagnostic::error(range, format!("unable to resolve class {name}"))
                            .with_code(codes::UNRESOLVED_CLASS),
                    );
                }
            }
        }
    }
    parsed
}

/// All class simple names resolvable from this request: default imports,
/// this module's own declarations, explicit imports, and classes declared in
/// any workspace source. Classpath jars stay opaque — entries contribute
/// nothing here.
fn known_class_names(
    request: &ParseRequest,
    ast: &groovy_ast::ModuleAst,
) -> HashSet<String> {
    let mut known: HashSet<String> =
        DEFAULT_CLASSES.iter().map(|s| s.to_string()).collect();

    for id in ast.ids() {
        match ast.kind(id) {
            groovy_ast::NodeKind::Class { name, .. } => {
                known.insert(name.clone());
            }
            groovy_ast::NodeKind::Import { class_name, alias, is_star, .. } => {
                if *is_star {
                    continue;
                }
                let simple = class_name.rsplit('.').next().unwrap_or(class_name);
                known.insert(alias.clone().unwrap_or_else(|| simple.to_string()));
            }
            _ => {}
        }
    }

    for (_, source) in &request.workspace_sources {
        collect_declared_classes(source, &mut known);
    }
    known
}

/// Cheap single-pass scan of a source for `class`/`interface`/`enum`/`trait`
/// declarations, without a full parse.
pub fn collect_declared_classes(source: &str, out: &mut HashSet<String>) {
    let tokens = groovy_lexer::tokenize(source);
    for window in tokens.windows(2) {
        let [kw, name] = window else { continue };
        if matches!(kw.kind, TokenKind::Keyword)
            && matches!(&*kw.text, "class" | "interface" | "enum" | "trait")
            && name.kind == TokenKind::Identifier
        {
            out.insert(name.text.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_test_support::{must, must_some};
    use url::Url;

    fn request(content: &str) -> ParseRequest {
        ParseRequest::new(must(Url::parse("file:///test.groovy")), content)
    }

    #[test]
    fn parse_never_fails_on_garbage() {
        let parsed = parse(&request("%%% ??? ,,, ]]"));
        assert!(parsed.ast.is_some());
        assert!(!parsed.diagnostics.is_empty());
    }

    #[test]
    fn same_content_gives_equal_diagnostics() {
        let content = "def x = \nclass {";
        let a = parse(&request(content));
        let b = parse(&request(content));
        assert_eq!(a.diagnostics, b.diagnostics);
    }

    #[test]
    fn unresolved_class_flagged_at_semantic_phase() {
        let req = request("new Nonexistent()")
            .with_phase(CompilePhase::SemanticAnalysis);
        let parsed = parse(&req);
        // Constructor type names are not variables; resolve the variable
        // spelling instead.
        let req2 = request("Nonexistent.foo()").with_phase(CompilePhase::SemanticAnalysis);
        let parsed2 = parse(&req2);
        let all: Vec<_> = parsed
            .diagnostics
            .iter()
            .chain(parsed2.diagnostics.iter())
            .filter(|d| d.code.as_deref() == Some(codes::UNRESOLVED_CLASS))
            .collect();
        assert!(!all.is_empty());
    }

    #[test]
    fn workspace_sources_resolve_cross_file_classes() {
        let req = request("Helper.greet(\"x\")")
            .with_phase(CompilePhase::SemanticAnalysis)
            .with_workspace_sources(vec![(
                must(Url::parse("file:///lib.groovy")),
                "class Helper { static greet(n) { n } }".to_string(),
            )]);
        let parsed = parse(&req);
        assert!(
            parsed
                .diagnostics
                .iter()
                .all(|d| d.code.as_deref() != Some(codes::UNRESOLVED_CLASS)),
            "Helper should resolve via workspace sources: {:?}",
            parsed.diagnostics
        );
    }

    #[test]
    fn conversion_phase_skips_class_resolution() {
        let parsed = parse(&request("Unknown.thing()"));
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    }

    #[test]
    fn default_classes_sorted_unique() {
        let mut seen = HashSet::new();
        for name in DEFAULT_CLASSES {
            assert!(seen.insert(name), "duplicate default class {name}");
        }
        let _ = must_some(DEFAULT_CLASSES.first());
    }
}
