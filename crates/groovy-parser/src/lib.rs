//! Parser facade for the Groovy analyzer core.
//!
//! Drives the front end up to a configurable compile phase and always comes
//! back with a usable result: an arena AST when anything parseable was
//! found, plus diagnostics in editor coordinates. Compile errors are data,
//! not `Err` — the only callers of this crate are language providers that
//! must keep answering on broken buffers.

mod budget;
mod diagnostics;
mod facade;
mod parser;
mod request;
mod resolver;

pub use budget::ParseBudget;
pub use diagnostics::{Diagnostic, Severity, codes};
pub use facade::{collect_declared_classes, parse};
pub use parser::{ParsedModule, Parser};
pub use request::{CompilePhase, ParseRequest};
pub use resolver::{ResolutionReport, resolve_scopes};

#[cfg(test)]
#[allow(clippy::panic)]
mod parser_tests {
    use super::*;
    use groovy_ast::{ModuleAst, NodeId, NodeKind};
    use groovy_position::LineColumn;
    use groovy_test_support::{must, must_some};
    use pretty_assertions::assert_eq;
    use url::Url;

    fn parse_text(content: &str) -> ModuleAst {
        let req = ParseRequest::new(must(Url::parse("file:///t.groovy")), content);
        must_some(parse(&req).ast)
    }

    fn find_variable(ast: &ModuleAst, name: &str) -> Vec<NodeId> {
        ast.ids()
            .filter(|id| matches!(ast.kind(*id), NodeKind::Variable { name: n, .. } if n == name))
            .collect()
    }

    #[test]
    fn script_statements_wrap_into_synthetic_class() {
        let ast = parse_text("def greeting = \"hi\"\nprintln greeting\n");
        let root = must_some(ast.root());
        let classes = match ast.kind(root) {
            NodeKind::Module { classes, .. } => classes.clone(),
            other => panic!("expected module, got {other:?}"),
        };
        assert_eq!(classes.len(), 1);
        assert!(ast.node(classes[0]).synthetic);
        match ast.kind(classes[0]) {
            NodeKind::Class { name, methods, .. } => {
                assert_eq!(name, "t");
                assert_eq!(methods.len(), 1);
            }
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn local_references_resolve_to_declaration() {
        let ast = parse_text("def greeting = \"hi\"\nprintln greeting\n");
        let vars = find_variable(&ast, "greeting");
        assert_eq!(vars.len(), 2);
        let decl = vars[0];
        for var in &vars {
            match ast.kind(*var) {
                NodeKind::Variable { accessed_variable, .. } => {
                    assert_eq!(*accessed_variable, Some(decl));
                }
                _ => panic!("not a variable"),
            }
        }
    }

    #[test]
    fn declaration_ranges_use_compiler_coordinates() {
        let ast = parse_text("def greeting = \"hi\"");
        let decl = find_variable(&ast, "greeting")[0];
        // `greeting` starts at 1-based column 5 and ends before column 13.
        assert_eq!(ast.range(decl).start, LineColumn::new(1, 5));
        assert_eq!(ast.range(decl).end, LineColumn::new(1, 13));
    }

    #[test]
    fn class_with_static_method() {
        let ast = parse_text("package x\nclass Helper { static greet(n) { \"hi, $n\" } }\n");
        let class = must_some(ast.ids().find(|id| {
            matches!(ast.kind(*id), NodeKind::Class { name, .. } if name == "Helper")
        }));
        assert!(!ast.node(class).synthetic);
        let methods = match ast.kind(class) {
            NodeKind::Class { methods, .. } => methods.clone(),
            _ => panic!("not a class"),
        };
        assert_eq!(methods.len(), 1);
        match ast.kind(methods[0]) {
            NodeKind::Method { name, parameters, modifiers, .. } => {
                assert_eq!(name, "greet");
                assert_eq!(parameters.len(), 1);
                assert!(modifiers.is_static);
            }
            _ => panic!("not a method"),
        }
    }

    #[test]
    fn gstring_variables_resolve_to_parameters() {
        let ast = parse_text("class H { static greet(n) { \"hi, $n\" } }");
        let n_refs = find_variable(&ast, "n");
        assert_eq!(n_refs.len(), 1);
        let target = match ast.kind(n_refs[0]) {
            NodeKind::Variable { accessed_variable, .. } => *accessed_variable,
            _ => None,
        };
        let param = must_some(target);
        assert!(matches!(ast.kind(param), NodeKind::Parameter { name, .. } if name == "n"));
    }

    #[test]
    fn parent_ranges_contain_children() {
        let ast = parse_text(
            "class A {\n  def items = [1, 2, 3]\n  def go(x) {\n    if (x) { items.each { println it } }\n  }\n}\n",
        );
        for id in ast.ids() {
            let range = ast.range(id);
            if !range.is_valid() {
                continue;
            }
            for child in ast.kind(id).children() {
                let child_range = ast.range(child);
                if !child_range.is_valid() {
                    continue;
                }
                assert!(
                    range.contains_range(child_range),
                    "{} range {range} does not contain child {} range {child_range}",
                    ast.kind(id).label(),
                    ast.kind(child).label(),
                );
            }
        }
    }

    #[test]
    fn member_completion_shape_for_property_access() {
        let ast = parse_text("def list = [1, 2, 3]\nlist.size()\n");
        let call = must_some(ast.ids().find(|id| {
            matches!(ast.kind(*id), NodeKind::MethodCall { method, .. } if method == "size")
        }));
        match ast.kind(call) {
            NodeKind::MethodCall { object: Some(object), .. } => {
                assert!(matches!(
                    ast.kind(*object),
                    NodeKind::Variable { name, .. } if name == "list"
                ));
            }
            other => panic!("unexpected call shape: {other:?}"),
        }
    }

    #[test]
    fn named_arguments_become_map_entries() {
        let ast = parse_text("stage(name: 'build', parallel: true)\n");
        let entries: Vec<_> = ast
            .ids()
            .filter(|id| matches!(ast.kind(*id), NodeKind::MapEntry { .. }))
            .collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn trailing_closure_attaches_to_call() {
        let ast = parse_text("[1, 2].each { x -> println x }\n");
        let call = must_some(ast.ids().find(|id| {
            matches!(ast.kind(*id), NodeKind::MethodCall { method, .. } if method == "each")
        }));
        match ast.kind(call) {
            NodeKind::MethodCall { arguments, .. } => {
                assert_eq!(arguments.len(), 1);
                assert!(matches!(ast.kind(arguments[0]), NodeKind::Closure { .. }));
            }
            _ => panic!("not a call"),
        }
    }

    #[test]
    fn imports_and_package_parse() {
        let ast = parse_text("package a.b\nimport java.util.List\nimport static x.Y.z\nimport a.c.*\n");
        let root = must_some(ast.root());
        match ast.kind(root) {
            NodeKind::Module { package, imports, .. } => {
                assert!(package.is_some());
                assert_eq!(imports.len(), 3);
                assert!(matches!(
                    ast.kind(imports[1]),
                    NodeKind::Import { is_static: true, .. }
                ));
                assert!(matches!(
                    ast.kind(imports[2]),
                    NodeKind::Import { is_star: true, .. }
                ));
            }
            _ => panic!("not a module"),
        }
    }

    #[test]
    fn broken_member_recovers_to_next_member() {
        let ast = parse_text("class X {\n  def ok() { 1 }\n  ???\n  def alsoOk() { 2 }\n}\n");
        let methods: Vec<_> = ast
            .ids()
            .filter(|id| {
                matches!(ast.kind(*id), NodeKind::Method { name, .. } if name == "ok" || name == "alsoOk")
            })
            .collect();
        assert_eq!(methods.len(), 2);
    }
}
