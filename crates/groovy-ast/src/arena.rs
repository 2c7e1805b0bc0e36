//! Node arena: index-based ownership for one compiled module.

use crate::NodeKind;
use groovy_position::SourceRange;
use std::fmt;

/// Index of a node within its module's arena.
///
/// Ids are only meaningful against the arena that allocated them; cross-file
/// references pair an id with the owning document's URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// One AST node: kind, compiler-coordinate range, synthetic marker.
///
/// Synthetic nodes are fabricated by the front end (script wrapper class,
/// implicit run method); the relationship tracker descends through them
/// without recording them.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: NodeKind,
    pub range: SourceRange,
    pub synthetic: bool,
}

/// Arena of nodes for one module, with the module root at `root`.
///
/// The arena is append-only while the parser and resolver run, then frozen
/// behind an `Arc` inside the parse result. A node's range always contains
/// every child's range; the parser widens parent ranges on attach to keep
/// that true.
#[derive(Debug, Clone, Default)]
pub struct ModuleAst {
    nodes: Vec<AstNode>,
    root: Option<NodeId>,
}

impl ModuleAst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, range: SourceRange) -> NodeId {
        self.alloc_node(AstNode { kind, range, synthetic: false })
    }

    pub fn alloc_synthetic(&mut self, kind: NodeKind, range: SourceRange) -> NodeId {
        self.alloc_node(AstNode { kind, range, synthetic: true })
    }

    fn alloc_node(&mut self, node: AstNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.index()]
    }

    /// Fallible lookup for ids that may come from a different arena
    /// generation (stale symbol handles).
    pub fn get(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn range(&self, id: NodeId) -> SourceRange {
        self.node(id).range
    }

    /// Widens `id`'s range to include `child_range`.
    pub fn widen(&mut self, id: NodeId, child_range: SourceRange) {
        let node = self.node_mut(id);
        node.range = node.range.union(child_range);
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Points a variable expression at its declaration. No-op for other
    /// kinds; the resolver only calls this for variables.
    pub fn set_accessed_variable(&mut self, id: NodeId, target: NodeId) {
        if let NodeKind::Variable { accessed_variable, .. } = &mut self.node_mut(id).kind {
            *accessed_variable = Some(target);
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use groovy_position::{LineColumn, SourceRange};
    use pretty_assertions::assert_eq;

    fn range(l1: u32, c1: u32, l2: u32, c2: u32) -> SourceRange {
        SourceRange::new(LineColumn::new(l1, c1), LineColumn::new(l2, c2))
    }

    #[test]
    fn alloc_returns_sequential_ids() {
        let mut ast = ModuleAst::new();
        let a = ast.alloc(NodeKind::Variable { name: "a".into(), accessed_variable: None }, range(1, 1, 1, 2));
        let b = ast.alloc(NodeKind::Constant { value: crate::ConstantValue::Null }, range(1, 5, 1, 9));
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(ast.len(), 2);
    }

    #[test]
    fn widen_unions_ranges() {
        let mut ast = ModuleAst::new();
        let id = ast.alloc(NodeKind::Block { statements: vec![] }, range(1, 1, 1, 1));
        ast.widen(id, range(1, 1, 3, 10));
        assert_eq!(ast.range(id), range(1, 1, 3, 10));
    }

    #[test]
    fn accessed_variable_points_at_declaration() {
        let mut ast = ModuleAst::new();
        let decl = ast.alloc(
            NodeKind::Variable { name: "x".into(), accessed_variable: None },
            range(1, 5, 1, 6),
        );
        ast.set_accessed_variable(decl, decl);
        match ast.kind(decl) {
            NodeKind::Variable { accessed_variable, .. } => {
                assert_eq!(*accessed_variable, Some(decl));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}
