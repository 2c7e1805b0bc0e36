//! Minimal, deterministic type inference.
//!
//! Only what member resolution needs: a declared type wins; list literals
//! become `ArrayList<E>` when homogeneous (primitives boxed) and
//! `ArrayList<Object>` otherwise; map literals become `LinkedHashMap`; a
//! literal's static type is used when known; everything else is `Object`.
//! There is no flow sensitivity and no least-upper-bound computation.

use crate::visitor::ModuleVisit;
use groovy_ast::{ModuleAst, NodeId, NodeKind};

/// Recursion bound when chasing initializers through variables.
const MAX_INFER_DEPTH: usize = 8;

/// Strips generics: `ArrayList<Integer>` → `ArrayList`.
pub fn raw_type(name: &str) -> &str {
    name.split('<').next().unwrap_or(name).trim()
}

/// Boxes primitive spellings to their wrapper classes.
pub fn boxed(name: &str) -> &str {
    match name {
        "int" | "short" | "byte" => "Integer",
        "long" => "Long",
        "double" => "Double",
        "float" => "Float",
        "boolean" => "Boolean",
        "char" => "Character",
        other => other,
    }
}

pub struct TypeInferencer<'a> {
    ast: &'a ModuleAst,
    visit: &'a ModuleVisit,
}

impl<'a> TypeInferencer<'a> {
    pub fn new(ast: &'a ModuleAst, visit: &'a ModuleVisit) -> Self {
        Self { ast, visit }
    }

    /// Static type of an expression, with generics when the expression is a
    /// homogeneous collection literal.
    pub fn infer_expr(&self, expr: NodeId) -> String {
        self.infer_inner(expr, 0)
    }

    fn infer_inner(&self, expr: NodeId, depth: usize) -> String {
        if depth > MAX_INFER_DEPTH {
            return "Object".to_string();
        }
        match self.ast.kind(expr) {
            NodeKind::Constant { value } => value.type_name().to_string(),
            NodeKind::GString { .. } => "String".to_string(),
            NodeKind::ListLiteral { elements } => {
                if elements.is_empty() {
                    return "ArrayList".to_string();
                }
                let first = self.infer_inner(elements[0], depth + 1);
                let homogeneous = elements
                    .iter()
                    .all(|e| self.infer_inner(*e, depth + 1) == first);
                if homogeneous && first != "Object" {
                    format!("ArrayList<{}>", boxed(&first))
                } else {
                    "ArrayList<Object>".to_string()
                }
            }
            NodeKind::MapLiteral { .. } => "LinkedHashMap".to_string(),
            NodeKind::CastExpr { type_name, .. } => type_name.clone(),
            NodeKind::ConstructorCall { type_name, .. } => type_name.clone(),
            NodeKind::Closure { .. } | NodeKind::Lambda { .. } => "Closure".to_string(),
            NodeKind::Variable { accessed_variable: Some(decl), .. } => {
                self.declared_type(*decl, depth + 1)
            }
            NodeKind::BinaryExpr { op, left, .. } => match op.as_str() {
                ".." | "..<" => "Range".to_string(),
                "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" | "instanceof" | "in" => {
                    "Boolean".to_string()
                }
                "+" | "-" | "*" | "/" | "%" | "**" => self.infer_inner(*left, depth + 1),
                _ => "Object".to_string(),
            },
            _ => "Object".to_string(),
        }
    }

    /// Type of a declaration node: explicit spelling first, then the
    /// inferred initializer type.
    pub fn declared_type(&self, decl: NodeId, depth: usize) -> String {
        match self.ast.kind(decl) {
            NodeKind::Parameter { type_name, .. } => {
                type_name.clone().unwrap_or_else(|| "Object".to_string())
            }
            NodeKind::Field { type_name, initializer, .. }
            | NodeKind::Property { type_name, initializer, .. } => match type_name {
                Some(spec) if spec != "def" => spec.clone(),
                _ => initializer
                    .map(|init| self.infer_inner(init, depth + 1))
                    .unwrap_or_else(|| "Object".to_string()),
            },
            NodeKind::Variable { .. } => {
                // A local declaration: its VariableDeclaration parent holds
                // the spelling and initializer.
                let Some(parent) = self.visit.parent(decl) else {
                    return "Object".to_string();
                };
                match self.ast.kind(parent) {
                    NodeKind::VariableDeclaration { type_name, initializer, .. } => {
                        match type_name {
                            Some(spec) if spec != "def" => spec.clone(),
                            _ => initializer
                                .map(|init| self.infer_inner(init, depth + 1))
                                .unwrap_or_else(|| "Object".to_string()),
                        }
                    }
                    _ => "Object".to_string(),
                }
            }
            _ => "Object".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::visit_module;
    use groovy_parser::ParseRequest;
    use groovy_test_support::{must, must_some};
    use pretty_assertions::assert_eq;
    use url::Url;

    fn infer_decl(content: &str, variable: &str) -> String {
        let uri = must(Url::parse("file:///i.groovy"));
        let ast = must_some(groovy_parser::parse(&ParseRequest::new(uri.clone(), content)).ast);
        let visit = visit_module(uri, &ast);
        let decl = must_some(ast.ids().find(|id| {
            matches!(ast.kind(*id), NodeKind::Variable { name, accessed_variable: Some(av) } if name == variable && *av == *id)
        }));
        TypeInferencer::new(&ast, &visit).declared_type(decl, 0)
    }

    #[test]
    fn homogeneous_list_is_generic_array_list() {
        assert_eq!(infer_decl("def xs = [1, 2, 3]", "xs"), "ArrayList<Integer>");
    }

    #[test]
    fn heterogeneous_list_is_object_array_list() {
        assert_eq!(infer_decl("def xs = [1, 'a']", "xs"), "ArrayList<Object>");
    }

    #[test]
    fn empty_list_is_raw_array_list() {
        assert_eq!(infer_decl("def xs = []", "xs"), "ArrayList");
    }

    #[test]
    fn map_literal_is_linked_hash_map() {
        assert_eq!(infer_decl("def m = [a: 1]", "m"), "LinkedHashMap");
    }

    #[test]
    fn declared_type_wins_over_initializer() {
        assert_eq!(infer_decl("List xs = [1]", "xs"), "List");
    }

    #[test]
    fn string_literal_and_gstring() {
        assert_eq!(infer_decl("def s = 'x'", "s"), "String");
        assert_eq!(infer_decl("def name = 'n'\ndef s = \"hi $name\"", "s"), "String");
    }

    #[test]
    fn unknown_initializer_falls_back_to_object() {
        assert_eq!(infer_decl("def x = mystery()", "x"), "Object");
    }

    #[test]
    fn raw_type_strips_generics() {
        assert_eq!(raw_type("ArrayList<Integer>"), "ArrayList");
        assert_eq!(raw_type("Map<String, List<Integer>>"), "Map");
        assert_eq!(raw_type("String"), "String");
    }
}
