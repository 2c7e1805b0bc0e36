//! Cross-file class catalog: what the resolver and providers know about
//! every class in the workspace.
//!
//! Summaries are extracted per module and keyed by simple name; handles are
//! (URI, node id) pairs, so a summary stays meaningful as long as its
//! document's parse result is current.

use groovy_ast::{ClassKind, Modifiers, ModuleAst, NodeId, NodeKind};
use groovy_position::Range;
use std::collections::HashMap;
use url::Url;

/// Bound on supertype walks; inheritance chains deeper than this are
/// treated as unresolved.
const MAX_SUPERTYPE_WALK: usize = 8;

/// One member (field, property, or method) of a summarized class.
#[derive(Debug, Clone)]
pub struct MemberSummary {
    pub name: String,
    pub node: NodeId,
    /// Parameter count for methods; `None` for fields and properties.
    pub arity: Option<usize>,
    pub type_name: Option<String>,
    pub modifiers: Modifiers,
    pub range: Range,
    pub selection_range: Range,
    /// Parameter names, for signature rendering.
    pub parameters: Vec<String>,
}

/// A class as seen from other files.
#[derive(Debug, Clone)]
pub struct ClassSummary {
    pub uri: Url,
    pub node: NodeId,
    pub name: String,
    pub kind: ClassKind,
    pub package: Option<String>,
    pub superclass: Option<String>,
    pub fields: Vec<MemberSummary>,
    pub properties: Vec<MemberSummary>,
    pub methods: Vec<MemberSummary>,
    pub synthetic: bool,
    pub name_range: Range,
}

impl ClassSummary {
    /// Fully qualified name, package included when present.
    pub fn qualified_name(&self) -> String {
        match &self.package {
            Some(pkg) => format!("{pkg}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// All class summaries visible to one compile, keyed by simple name.
#[derive(Debug, Clone, Default)]
pub struct ClassCatalog {
    classes: HashMap<String, ClassSummary>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every class declared in `ast`. Later modules win name clashes,
    /// matching last-writer-wins cache semantics.
    pub fn add_module(&mut self, uri: &Url, ast: &ModuleAst) {
        let Some(root) = ast.root() else { return };
        let package = match ast.kind(root) {
            NodeKind::Module { package, .. } => package.and_then(|p| match ast.kind(p) {
                NodeKind::Package { name } => Some(name.clone()),
                _ => None,
            }),
            _ => None,
        };
        let classes = match ast.kind(root) {
            NodeKind::Module { classes, .. } => classes.clone(),
            _ => return,
        };
        for class in classes {
            self.add_class(uri, ast, class, package.clone());
        }
    }

    fn add_class(&mut self, uri: &Url, ast: &ModuleAst, class: NodeId, package: Option<String>) {
        let node = ast.node(class);
        let NodeKind::Class {
            name,
            kind,
            superclass,
            fields,
            properties,
            methods,
            inner_classes,
            name_range,
            ..
        } = &node.kind
        else {
            return;
        };

        let summary = ClassSummary {
            uri: uri.clone(),
            node: class,
            name: name.clone(),
            kind: *kind,
            package: package.clone(),
            superclass: superclass.clone(),
            fields: fields.iter().filter_map(|m| summarize_member(ast, *m)).collect(),
            properties: properties.iter().filter_map(|m| summarize_member(ast, *m)).collect(),
            methods: methods.iter().filter_map(|m| summarize_member(ast, *m)).collect(),
            synthetic: node.synthetic,
            name_range: name_range.to_editor().unwrap_or_default(),
        };
        self.classes.insert(summary.name.clone(), summary);

        for inner in inner_classes {
            self.add_class(uri, ast, *inner, package.clone());
        }
    }

    pub fn class_named(&self, name: &str) -> Option<&ClassSummary> {
        self.classes.get(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassSummary> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// First method on `class_name` (supertypes included) matching name,
    /// preferring an exact arity match. Overload resolution is deliberately
    /// minimal: first name match, then first arity match.
    pub fn find_method(
        &self,
        class_name: &str,
        method: &str,
        arity: Option<usize>,
    ) -> Option<(&ClassSummary, &MemberSummary)> {
        let mut current = Some(class_name.to_string());
        for _ in 0..MAX_SUPERTYPE_WALK {
            let class = self.class_named(current.as_deref()?)?;
            let candidates: Vec<&MemberSummary> =
                class.methods.iter().filter(|m| m.name == method).collect();
            if !candidates.is_empty() {
                let exact = arity
                    .and_then(|n| candidates.iter().find(|m| m.arity == Some(n)).copied());
                return Some((class, exact.unwrap_or(candidates[0])));
            }
            current = class.superclass.clone();
        }
        None
    }

    /// Property or field lookup, walking supertypes.
    pub fn find_property(
        &self,
        class_name: &str,
        property: &str,
    ) -> Option<(&ClassSummary, &MemberSummary)> {
        let mut current = Some(class_name.to_string());
        for _ in 0..MAX_SUPERTYPE_WALK {
            let class = self.class_named(current.as_deref()?)?;
            if let Some(member) = class
                .properties
                .iter()
                .chain(class.fields.iter())
                .find(|m| m.name == property)
            {
                return Some((class, member));
            }
            current = class.superclass.clone();
        }
        None
    }
}

fn summarize_member(ast: &ModuleAst, member: NodeId) -> Option<MemberSummary> {
    match ast.kind(member) {
        NodeKind::Field { name, type_name, modifiers, name_range, .. }
        | NodeKind::Property { name, type_name, modifiers, name_range, .. } => {
            Some(MemberSummary {
                name: name.clone(),
                node: member,
                arity: None,
                type_name: type_name.clone(),
                modifiers: *modifiers,
                range: ast.range(member).to_editor().unwrap_or_default(),
                selection_range: name_range.to_editor().unwrap_or_default(),
                parameters: Vec::new(),
            })
        }
        NodeKind::Method { name, return_type, modifiers, parameters, name_range, .. } => {
            let parameter_names = parameters
                .iter()
                .filter_map(|p| match ast.kind(*p) {
                    NodeKind::Parameter { name, .. } => Some(name.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>();
            Some(MemberSummary {
                name: name.clone(),
                node: member,
                arity: Some(parameters.len()),
                type_name: return_type.clone(),
                modifiers: *modifiers,
                range: ast.range(member).to_editor().unwrap_or_default(),
                selection_range: name_range.to_editor().unwrap_or_default(),
                parameters: parameter_names,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_parser::ParseRequest;
    use groovy_test_support::{must, must_some};
    use pretty_assertions::assert_eq;

    fn catalog_of(content: &str) -> ClassCatalog {
        let uri = must(Url::parse("file:///c.groovy"));
        let ast = must_some(groovy_parser::parse(&ParseRequest::new(uri.clone(), content)).ast);
        let mut catalog = ClassCatalog::new();
        catalog.add_module(&uri, &ast);
        catalog
    }

    #[test]
    fn summarizes_members() {
        let catalog = catalog_of(
            "package x\nclass Helper {\n  static greet(n) { n }\n  def version = 2\n}\n",
        );
        let helper = must_some(catalog.class_named("Helper"));
        assert_eq!(helper.qualified_name(), "x.Helper");
        assert_eq!(helper.methods.len(), 1);
        assert_eq!(helper.methods[0].arity, Some(1));
        assert_eq!(helper.properties.len(), 1);
    }

    #[test]
    fn method_lookup_prefers_exact_arity() {
        let catalog = catalog_of(
            "class O {\n  def f(a) { 1 }\n  def f(a, b) { 2 }\n}\n",
        );
        let (_, two) = must_some(catalog.find_method("O", "f", Some(2)));
        assert_eq!(two.arity, Some(2));
        let (_, first) = must_some(catalog.find_method("O", "f", Some(9)));
        assert_eq!(first.arity, Some(1));
    }

    #[test]
    fn property_lookup_walks_supertypes() {
        let catalog = catalog_of(
            "class Base { def shared = 1 }\nclass Derived extends Base { }\n",
        );
        let (owner, member) = must_some(catalog.find_property("Derived", "shared"));
        assert_eq!(owner.name, "Base");
        assert_eq!(member.name, "shared");
    }

    #[test]
    fn script_classes_are_marked_synthetic() {
        let catalog = catalog_of("println 1\n");
        let script = must_some(catalog.class_named("c"));
        assert!(script.synthetic);
    }
}
