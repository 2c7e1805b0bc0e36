//! Depth-first relationship tracking over a parsed module.
//!
//! The visitor walks the arena in fixed child order under a stack
//! discipline: entering a node records it in the traversal list, the parent
//! map, and (for classes) the class-node list; leaving only pops the stack.
//! Synthetic nodes are descended through without being recorded, so their
//! real children attach to the nearest recorded ancestor. A map entry is
//! never rewritten once recorded.

use groovy_ast::{ModuleAst, NodeId, NodeKind};
use groovy_position::Position;
use std::collections::HashMap;
use url::Url;

/// Cap on parent-chain walks; deeper chains indicate a cycle and stop.
const MAX_PARENT_WALK: usize = 64;

/// Tracker output for one module: per-URI node list in traversal order,
/// reverse parent index, and the class nodes.
#[derive(Debug, Clone)]
pub struct ModuleVisit {
    pub uri: Url,
    /// Recorded nodes in depth-first order.
    pub nodes: Vec<NodeId>,
    /// Child → nearest recorded ancestor. Roots are absent.
    pub parents: HashMap<NodeId, NodeId>,
    /// Recorded Class nodes, outermost first.
    pub class_nodes: Vec<NodeId>,
}

impl ModuleVisit {
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parents.get(&node).copied()
    }

    /// Walks the parent chain until `pred` matches, bounded by a fixed
    /// depth cap.
    pub fn enclosing(
        &self,
        ast: &ModuleAst,
        node: NodeId,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        let mut current = node;
        for _ in 0..MAX_PARENT_WALK {
            if pred(ast.kind(current)) {
                return Some(current);
            }
            current = self.parent(current)?;
        }
        None
    }

    pub fn enclosing_class(&self, ast: &ModuleAst, node: NodeId) -> Option<NodeId> {
        self.enclosing(ast, node, |kind| matches!(kind, NodeKind::Class { .. }))
    }

    /// The method containing `node`. Script bodies have no recorded method
    /// wrapper (it is synthetic), so this can be `None` even inside
    /// executable code.
    pub fn enclosing_method(&self, ast: &ModuleAst, node: NodeId) -> Option<NodeId> {
        self.enclosing(ast, node, |kind| matches!(kind, NodeKind::Method { .. }))
    }
}

/// Builds the relationship maps for one module.
pub fn visit_module(uri: Url, ast: &ModuleAst) -> ModuleVisit {
    let mut visit =
        ModuleVisit { uri, nodes: Vec::new(), parents: HashMap::new(), class_nodes: Vec::new() };
    let mut stack: Vec<NodeId> = Vec::new();
    if let Some(root) = ast.root() {
        walk(ast, root, &mut stack, &mut visit);
    }
    visit
}

fn walk(ast: &ModuleAst, id: NodeId, stack: &mut Vec<NodeId>, visit: &mut ModuleVisit) {
    let node = ast.node(id);
    if node.synthetic {
        for child in node.kind.children() {
            walk(ast, child, stack, visit);
        }
        return;
    }
    if let Some(parent) = stack.last() {
        visit.parents.entry(id).or_insert(*parent);
    }
    visit.nodes.push(id);
    if matches!(node.kind, NodeKind::Class { .. }) {
        visit.class_nodes.push(id);
    }
    stack.push(id);
    for child in node.kind.children() {
        walk(ast, child, stack, visit);
    }
    stack.pop();
}

/// The most specific recorded node at an editor position.
///
/// Candidates are nodes with valid ranges containing the position; block
/// wrappers use inclusive containment so a cursor on a closing delimiter
/// still resolves. The smallest range wins; ties fall to the fixed kind
/// priority table, then to traversal order.
pub fn node_at(ast: &ModuleAst, visit: &ModuleVisit, pos: Position) -> Option<NodeId> {
    visit
        .nodes
        .iter()
        .copied()
        .filter_map(|id| {
            let range = ast.range(id).to_editor()?;
            let kind = ast.kind(id);
            let inclusive = matches!(
                kind,
                NodeKind::Block { .. }
                    | NodeKind::Class { .. }
                    | NodeKind::Method { .. }
                    | NodeKind::Module { .. }
                    | NodeKind::Closure { .. }
            );
            let hit = if inclusive { range.contains_inclusive(pos) } else { range.contains(pos) };
            hit.then_some((id, range, kind.position_priority()))
        })
        .min_by_key(|(id, range, priority)| (range.size_key(), u8::MAX - priority, id.0))
        .map(|(id, _, _)| id)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use groovy_parser::ParseRequest;
    use groovy_test_support::{must, must_some};
    use pretty_assertions::assert_eq;

    fn parse(content: &str) -> (ModuleAst, ModuleVisit) {
        let uri = must(Url::parse("file:///v.groovy"));
        let req = ParseRequest::new(uri.clone(), content);
        let ast = must_some(groovy_parser::parse(&req).ast);
        let visit = visit_module(uri, &ast);
        (ast, visit)
    }

    #[test]
    fn parent_ranges_contain_child_ranges() {
        let (ast, visit) = parse(
            "class A {\n  def f(x) {\n    if (x > 1) { return x * 2 }\n    return 0\n  }\n}\n",
        );
        for (child, parent) in &visit.parents {
            let parent_range = ast.range(*parent);
            let child_range = ast.range(*child);
            if !parent_range.is_valid() || !child_range.is_valid() {
                continue;
            }
            assert!(
                parent_range.contains_range(child_range),
                "parent {} does not contain child {}",
                ast.kind(*parent).label(),
                ast.kind(*child).label()
            );
        }
    }

    #[test]
    fn synthetic_wrappers_are_not_recorded() {
        let (ast, visit) = parse("def x = 1\nprintln x\n");
        for id in &visit.nodes {
            assert!(!ast.node(*id).synthetic);
        }
        // Statements still appear, attached beneath the module.
        assert!(
            visit
                .nodes
                .iter()
                .any(|id| matches!(ast.kind(*id), NodeKind::VariableDeclaration { .. }))
        );
        assert!(visit.class_nodes.is_empty());
    }

    #[test]
    fn node_at_prefers_smallest_range() {
        let (ast, visit) = parse("def value = other\n");
        // Position on `other` — both the declaration statement and the
        // variable contain it; the variable is smaller.
        let hit = must_some(node_at(&ast, &visit, Position::new(0, 13)));
        match ast.kind(hit) {
            NodeKind::Variable { name, .. } => assert_eq!(name, "other"),
            other => panic!("expected variable, got {other:?}"),
        }
    }

    #[test]
    fn node_at_breaks_ties_by_priority() {
        let (ast, visit) = parse("greet(name)\n");
        // On `name`: the Variable and nothing smaller.
        let hit = must_some(node_at(&ast, &visit, Position::new(0, 7)));
        assert!(matches!(ast.kind(hit), NodeKind::Variable { name, .. } if name == "name"));
    }

    #[test]
    fn node_at_misses_outside_any_node() {
        let (ast, visit) = parse("x = 1\n");
        assert_eq!(node_at(&ast, &visit, Position::new(40, 0)), None);
    }

    #[test]
    fn enclosing_class_walks_parents() {
        let (ast, visit) = parse("class Box {\n  def open() { contents }\n}\n");
        let var = must_some(
            visit
                .nodes
                .iter()
                .copied()
                .find(|id| matches!(ast.kind(*id), NodeKind::Variable { name, .. } if name == "contents")),
        );
        let class = must_some(visit.enclosing_class(&ast, var));
        assert!(matches!(ast.kind(class), NodeKind::Class { name, .. } if name == "Box"));
        assert!(visit.enclosing_method(&ast, var).is_some());
    }
}
