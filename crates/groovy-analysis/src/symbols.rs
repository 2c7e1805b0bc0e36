//! The per-document symbol index: typed declarations plus ref→decl edges.
//!
//! References are unified through the compiler's back-pointers, not name
//! lookups: a variable's definition is its `accessed_variable` (a
//! declaration points at itself), method calls resolve by (receiver class,
//! name, arity) against the catalog, and property accesses resolve against
//! the receiver's class walking supertypes. Edges carry opaque
//! (URI, node id) handles so cross-file targets survive replacement of this
//! document's parse result.

use crate::catalog::ClassCatalog;
use crate::types::{TypeInferencer, raw_type};
use crate::visitor::ModuleVisit;
use groovy_ast::{ClassKind, Modifiers, ModuleAst, NodeId, NodeKind};
use groovy_position::Range;
use std::collections::HashMap;
use url::Url;

/// Opaque identity of a declaration: owning document plus arena id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolHandle {
    pub uri: Url,
    pub node: NodeId,
}

impl SymbolHandle {
    pub fn new(uri: Url, node: NodeId) -> Self {
        Self { uri, node }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Class,
    Interface,
    Enum,
    Trait,
    Method,
    Constructor,
    Field,
    Property,
    Parameter,
    LocalVariable,
    Import,
}

/// One named declaration with its ranges and kind-specific detail.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub handle: SymbolHandle,
    pub name: String,
    pub kind: DeclarationKind,
    /// Enclosing class simple name, when there is a real one.
    pub container: Option<String>,
    pub type_name: Option<String>,
    /// Parameter count for methods.
    pub arity: Option<usize>,
    pub modifiers: Modifiers,
    /// Full declaration extent.
    pub range: Range,
    /// The identifier alone.
    pub selection_range: Range,
}

/// One resolved reference site.
#[derive(Debug, Clone)]
pub struct ReferenceEdge {
    pub node: NodeId,
    /// Exact editor range of the referencing name.
    pub range: Range,
    pub target: SymbolHandle,
}

/// Member declaration indices grouped per class node.
#[derive(Debug, Clone, Default)]
pub struct ClassMemberIndices {
    pub fields: Vec<usize>,
    pub properties: Vec<usize>,
    pub methods: Vec<usize>,
    pub inner_classes: Vec<usize>,
}

/// The index for one document.
#[derive(Debug, Clone)]
pub struct SymbolIndex {
    pub uri: Url,
    pub declarations: Vec<Declaration>,
    pub references: Vec<ReferenceEdge>,
    by_node: HashMap<NodeId, usize>,
    by_name: HashMap<String, Vec<usize>>,
    by_class: HashMap<NodeId, ClassMemberIndices>,
}

impl SymbolIndex {
    pub fn declaration_at(&self, node: NodeId) -> Option<&Declaration> {
        self.by_node.get(&node).map(|idx| &self.declarations[*idx])
    }

    pub fn declarations_named(&self, name: &str) -> impl Iterator<Item = &Declaration> {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|idx| &self.declarations[*idx])
    }

    pub fn members_of(&self, class: NodeId) -> Option<&ClassMemberIndices> {
        self.by_class.get(&class)
    }

    pub fn declaration(&self, idx: usize) -> &Declaration {
        &self.declarations[idx]
    }

    /// Edges whose target is the given declaration handle.
    pub fn references_to<'a>(
        &'a self,
        target: &'a SymbolHandle,
    ) -> impl Iterator<Item = &'a ReferenceEdge> {
        self.references.iter().filter(move |edge| &edge.target == target)
    }
}

/// Builds the index in one linear pass over the tracker's node list.
pub fn build_index(
    uri: &Url,
    ast: &ModuleAst,
    visit: &ModuleVisit,
    catalog: &ClassCatalog,
) -> SymbolIndex {
    let mut index = SymbolIndex {
        uri: uri.clone(),
        declarations: Vec::new(),
        references: Vec::new(),
        by_node: HashMap::new(),
        by_name: HashMap::new(),
        by_class: HashMap::new(),
    };
    let inferencer = TypeInferencer::new(ast, visit);

    for id in visit.nodes.iter().copied() {
        collect_declaration(uri, ast, visit, id, &mut index);
        collect_references(uri, ast, visit, catalog, &inferencer, id, &mut index);
    }
    index
}

fn push_declaration(index: &mut SymbolIndex, decl: Declaration) -> usize {
    let idx = index.declarations.len();
    index.by_node.insert(decl.handle.node, idx);
    index.by_name.entry(decl.name.clone()).or_default().push(idx);
    index.declarations.push(decl);
    idx
}

fn enclosing_class_name(ast: &ModuleAst, visit: &ModuleVisit, node: NodeId) -> Option<String> {
    let class = visit.enclosing_class(ast, node)?;
    match ast.kind(class) {
        NodeKind::Class { name, .. } => Some(name.clone()),
        _ => None,
    }
}

fn collect_declaration(
    uri: &Url,
    ast: &ModuleAst,
    visit: &ModuleVisit,
    id: NodeId,
    index: &mut SymbolIndex,
) {
    let range = match ast.range(id).to_editor() {
        Some(r) => r,
        None => return,
    };
    let handle = SymbolHandle::new(uri.clone(), id);
    match ast.kind(id) {
        NodeKind::Class { name, kind, modifiers, name_range, .. } => {
            let decl_kind = match kind {
                ClassKind::Class => DeclarationKind::Class,
                ClassKind::Interface => DeclarationKind::Interface,
                ClassKind::Enum => DeclarationKind::Enum,
                ClassKind::Trait => DeclarationKind::Trait,
            };
            let outer = visit.parent(id).and_then(|p| visit.enclosing_class(ast, p));
            let container = outer.and_then(|c| match ast.kind(c) {
                NodeKind::Class { name, .. } => Some(name.clone()),
                _ => None,
            });
            let decl = Declaration {
                handle,
                name: name.clone(),
                kind: decl_kind,
                container,
                type_name: None,
                arity: None,
                modifiers: *modifiers,
                range,
                selection_range: name_range.to_editor().unwrap_or(range),
            };
            let idx = push_declaration(index, decl);
            index.by_class.entry(id).or_default();
            if let Some(outer) = outer {
                index.by_class.entry(outer).or_default().inner_classes.push(idx);
            }
        }
        NodeKind::Field { name, type_name, modifiers, name_range, .. } => {
            let container = enclosing_class_name(ast, visit, id);
            let decl = Declaration {
                handle,
                name: name.clone(),
                kind: DeclarationKind::Field,
                container,
                type_name: type_name.clone(),
                arity: None,
                modifiers: *modifiers,
                range,
                selection_range: name_range.to_editor().unwrap_or(range),
            };
            let idx = push_declaration(index, decl);
            if let Some(class) = visit.enclosing_class(ast, id) {
                index.by_class.entry(class).or_default().fields.push(idx);
            }
        }
        NodeKind::Property { name, type_name, modifiers, name_range, .. } => {
            let container = enclosing_class_name(ast, visit, id);
            let decl = Declaration {
                handle,
                name: name.clone(),
                kind: DeclarationKind::Property,
                container,
                type_name: type_name.clone(),
                arity: None,
                modifiers: *modifiers,
                range,
                selection_range: name_range.to_editor().unwrap_or(range),
            };
            let idx = push_declaration(index, decl);
            if let Some(class) = visit.enclosing_class(ast, id) {
                index.by_class.entry(class).or_default().properties.push(idx);
            }
        }
        NodeKind::Method {
            name, return_type, modifiers, parameters, is_constructor, name_range, ..
        } => {
            let container = enclosing_class_name(ast, visit, id);
            let decl = Declaration {
                handle,
                name: name.clone(),
                kind: if *is_constructor {
                    DeclarationKind::Constructor
                } else {
                    DeclarationKind::Method
                },
                container,
                type_name: return_type.clone(),
                arity: Some(parameters.len()),
                modifiers: *modifiers,
                range,
                selection_range: name_range.to_editor().unwrap_or(range),
            };
            let idx = push_declaration(index, decl);
            if let Some(class) = visit.enclosing_class(ast, id) {
                index.by_class.entry(class).or_default().methods.push(idx);
            }
        }
        NodeKind::Parameter { name, type_name, name_range, .. } => {
            let decl = Declaration {
                handle,
                name: name.clone(),
                kind: DeclarationKind::Parameter,
                container: enclosing_class_name(ast, visit, id),
                type_name: type_name.clone(),
                arity: None,
                modifiers: Modifiers::default(),
                range,
                selection_range: name_range.to_editor().unwrap_or(range),
            };
            push_declaration(index, decl);
        }
        NodeKind::Import { class_name, alias, .. } => {
            let simple = alias
                .clone()
                .unwrap_or_else(|| class_name.rsplit('.').next().unwrap_or(class_name).to_string());
            let decl = Declaration {
                handle,
                name: simple,
                kind: DeclarationKind::Import,
                container: None,
                type_name: Some(class_name.clone()),
                arity: None,
                modifiers: Modifiers::default(),
                range,
                selection_range: range,
            };
            push_declaration(index, decl);
        }
        // A variable that accesses itself is a local declaration.
        NodeKind::Variable { name, accessed_variable: Some(target) } if *target == id => {
            let decl = Declaration {
                handle,
                name: name.clone(),
                kind: DeclarationKind::LocalVariable,
                container: enclosing_class_name(ast, visit, id),
                type_name: None,
                arity: None,
                modifiers: Modifiers::default(),
                range,
                selection_range: range,
            };
            push_declaration(index, decl);
        }
        _ => {}
    }
}

fn collect_references(
    uri: &Url,
    ast: &ModuleAst,
    visit: &ModuleVisit,
    catalog: &ClassCatalog,
    inferencer: &TypeInferencer<'_>,
    id: NodeId,
    index: &mut SymbolIndex,
) {
    match ast.kind(id) {
        NodeKind::Variable { name, accessed_variable } => {
            let range = match ast.range(id).to_editor() {
                Some(r) => r,
                None => return,
            };
            if let Some(target) = accessed_variable {
                index.references.push(ReferenceEdge {
                    node: id,
                    range,
                    target: SymbolHandle::new(uri.clone(), *target),
                });
            } else if let Some(class) = catalog.class_named(name) {
                if !class.synthetic {
                    index.references.push(ReferenceEdge {
                        node: id,
                        range,
                        target: SymbolHandle::new(class.uri.clone(), class.node),
                    });
                }
            }
        }
        NodeKind::PropertyExpr { object, property, .. } => {
            let Some(receiver) =
                receiver_class_name(ast, visit, catalog, inferencer, Some(*object), id)
            else {
                return;
            };
            let prop_name = match ast.kind(*property) {
                NodeKind::Constant { value } => match value.as_str() {
                    Some(s) => s.to_string(),
                    None => return,
                },
                _ => return,
            };
            if let Some((owner, member)) = catalog.find_property(&receiver, &prop_name) {
                if let Some(range) = ast.range(*property).to_editor() {
                    index.references.push(ReferenceEdge {
                        node: *property,
                        range,
                        target: SymbolHandle::new(owner.uri.clone(), member.node),
                    });
                }
            }
        }
        NodeKind::MethodCall { object, method, method_range, arguments, .. } => {
            let Some(receiver) =
                receiver_class_name(ast, visit, catalog, inferencer, *object, id)
            else {
                return;
            };
            if let Some((owner, member)) =
                catalog.find_method(&receiver, method, Some(arguments.len()))
            {
                if let Some(range) = method_range.to_editor() {
                    index.references.push(ReferenceEdge {
                        node: id,
                        range,
                        target: SymbolHandle::new(owner.uri.clone(), member.node),
                    });
                }
            }
        }
        NodeKind::ConstructorCall { type_name, type_range, .. } => {
            let name = raw_type(type_name);
            if let Some(class) = catalog.class_named(name) {
                if !class.synthetic {
                    if let Some(range) = type_range.to_editor() {
                        index.references.push(ReferenceEdge {
                            node: id,
                            range,
                            target: SymbolHandle::new(class.uri.clone(), class.node),
                        });
                    }
                }
            }
        }
        NodeKind::ClassExpr { type_name } => {
            let name = raw_type(type_name);
            if let Some(class) = catalog.class_named(name) {
                if !class.synthetic {
                    if let Some(range) = ast.range(id).to_editor() {
                        index.references.push(ReferenceEdge {
                            node: id,
                            range,
                            target: SymbolHandle::new(class.uri.clone(), class.node),
                        });
                    }
                }
            }
        }
        _ => {}
    }
}

/// Resolves the class a member access dispatches on.
///
/// `object == None` means an implicit-`this` call: the enclosing class.
/// A capitalized unresolved variable naming a catalog class is a static
/// receiver. Anything else falls back to the inferred static type of the
/// receiver expression, generics stripped.
pub fn receiver_class_name(
    ast: &ModuleAst,
    visit: &ModuleVisit,
    catalog: &ClassCatalog,
    inferencer: &TypeInferencer<'_>,
    object: Option<NodeId>,
    site: NodeId,
) -> Option<String> {
    let Some(object) = object else {
        return enclosing_class_name(ast, visit, site);
    };
    match ast.kind(object) {
        NodeKind::Variable { name, accessed_variable: None } => {
            if name == "this" {
                return enclosing_class_name(ast, visit, site);
            }
            if name == "super" {
                let class = visit.enclosing_class(ast, site)?;
                return match ast.kind(class) {
                    NodeKind::Class { superclass, .. } => superclass.clone(),
                    _ => None,
                };
            }
            if catalog.class_named(name).is_some() {
                return Some(name.clone());
            }
            None
        }
        _ => {
            let inferred = inferencer.infer_expr(object);
            if inferred == "Object" {
                None
            } else {
                Some(raw_type(&inferred).to_string())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::visitor::visit_module;
    use groovy_parser::ParseRequest;
    use groovy_test_support::{must, must_some};
    use pretty_assertions::assert_eq;

    struct Fixture {
        modules: Vec<(Url, ModuleAst, ModuleVisit)>,
        catalog: ClassCatalog,
    }

    fn fixture(files: &[(&str, &str)]) -> Fixture {
        let mut modules = Vec::new();
        let mut catalog = ClassCatalog::new();
        for (path, content) in files {
            let uri = must(Url::parse(&format!("file://{path}")));
            let ast = must_some(
                groovy_parser::parse(&ParseRequest::new(uri.clone(), *content)).ast,
            );
            let visit = visit_module(uri.clone(), &ast);
            catalog.add_module(&uri, &ast);
            modules.push((uri, ast, visit));
        }
        Fixture { modules, catalog }
    }

    impl Fixture {
        fn index(&self, i: usize) -> SymbolIndex {
            let (uri, ast, visit) = &self.modules[i];
            build_index(uri, ast, visit, &self.catalog)
        }
    }

    #[test]
    fn local_declaration_and_self_edge() {
        let fx = fixture(&[("/a.groovy", "def greeting = \"hi\"\nprintln greeting\n")]);
        let index = fx.index(0);
        let decl = must_some(
            index.declarations.iter().find(|d| d.kind == DeclarationKind::LocalVariable),
        );
        assert_eq!(decl.name, "greeting");
        let refs: Vec<_> = index.references_to(&decl.handle).collect();
        // The self edge plus the println argument.
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn cross_file_static_method_call_edge() {
        let fx = fixture(&[
            ("/lib.groovy", "package x\nclass Helper { static greet(n) { \"hi, $n\" } }\n"),
            ("/app.groovy", "package x\nHelper.greet(\"world\")\n"),
        ]);
        let index = fx.index(1);
        let helper_uri = &fx.modules[0].0;
        let edge = must_some(index.references.iter().find(|e| &e.target.uri == helper_uri
            && matches!(fx.modules[0].1.kind(e.target.node), NodeKind::Method { name, .. } if name == "greet")));
        // The edge range covers `greet` on line 1 of app.groovy.
        assert_eq!(edge.range.start.line, 1);
        assert_eq!(edge.range.start.character, 7);
    }

    #[test]
    fn cross_file_static_property_edges() {
        let fx = fixture(&[
            ("/m.groovy", "class M { static val = 1 }\n"),
            ("/u1.groovy", "println M.val\n"),
            ("/u2.groovy", "def x = M.val + 1\n"),
        ]);
        let m_ast = &fx.modules[0].1;
        let val_node = must_some(m_ast.ids().find(
            |id| matches!(m_ast.kind(*id), NodeKind::Property { name, .. } if name == "val"),
        ));
        let target = SymbolHandle::new(fx.modules[0].0.clone(), val_node);
        for i in [1usize, 2] {
            let index = fx.index(i);
            let edges: Vec<_> = index.references_to(&target).collect();
            assert_eq!(edges.len(), 1, "file {i} should reference M.val once");
        }
    }

    #[test]
    fn instance_property_resolves_through_inferred_type() {
        let fx = fixture(&[(
            "/t.groovy",
            "class Box { def label = 'x' }\ndef b = new Box()\nprintln b.label\n",
        )]);
        let index = fx.index(0);
        let label_edge = index.references.iter().any(|e| {
            matches!(
                fx.modules[0].1.kind(e.target.node),
                NodeKind::Property { name, .. } if name == "label"
            )
        });
        assert!(label_edge, "b.label should resolve via the inferred Box type");
    }

    #[test]
    fn class_reference_edges_from_qualifier_and_constructor() {
        let fx = fixture(&[(
            "/c.groovy",
            "class Widget { }\ndef w = new Widget()\nWidget.metaClass\n",
        )]);
        let index = fx.index(0);
        let class_node = must_some(fx.modules[0].1.ids().find(|id| {
            matches!(fx.modules[0].1.kind(*id), NodeKind::Class { name, .. } if name == "Widget")
                && !fx.modules[0].1.node(*id).synthetic
        }));
        let target = SymbolHandle::new(fx.modules[0].0.clone(), class_node);
        let edges: Vec<_> = index.references_to(&target).collect();
        assert_eq!(edges.len(), 2, "constructor call and qualifier reference");
    }

    #[test]
    fn members_grouped_by_class() {
        let fx = fixture(&[(
            "/g.groovy",
            "class G {\n  private int count = 0\n  def label = 'g'\n  def bump() { count++ }\n}\n",
        )]);
        let index = fx.index(0);
        let (_, ast, visit) = &fx.modules[0];
        let class = visit.class_nodes[0];
        let members = must_some(index.members_of(class));
        assert_eq!(members.fields.len(), 1);
        assert_eq!(members.properties.len(), 1);
        assert_eq!(members.methods.len(), 1);
        let field = index.declaration(members.fields[0]);
        assert_eq!(field.name, "count");
        assert_eq!(field.container.as_deref(), Some("G"));
        let _ = ast;
    }
}
