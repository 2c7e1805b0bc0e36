//! Shared position → declaration resolution.
//!
//! Every navigation-shaped provider (definition, references, rename,
//! hover, signature help) funnels through [`resolve_at`]: find the most
//! specific node at the position, then map it to a canonical declaration —
//! the node's own declaration when the cursor sits on its name, otherwise
//! the target of the reference edge the symbol index recorded for it.

use groovy_analysis::{ClassCatalog, Declaration, SymbolHandle, node_at};
use groovy_compilation::CompilationCache;
use groovy_position::Position;
use url::Url;

/// What the providers know about workspace membership. Declarations in
/// unowned URIs are dependency code: navigable targets return empty
/// results and rename refuses them.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceView {
    /// Workspace root; `None` means every open document is owned.
    pub root: Option<Url>,
    /// Dependency classpath entries; never owned, never edited.
    pub classpath: Vec<Url>,
}

impl WorkspaceView {
    pub fn owns(&self, uri: &Url) -> bool {
        if self.classpath.iter().any(|dep| uri.as_str().starts_with(dep.as_str())) {
            return false;
        }
        match &self.root {
            Some(root) => uri.as_str().starts_with(root.as_str()),
            None => true,
        }
    }
}

/// The canonical declaration for a position, if one resolves.
pub fn resolve_at(
    cache: &CompilationCache,
    uri: &Url,
    position: Position,
) -> Option<(SymbolHandle, Declaration)> {
    let result = cache.get_any(uri)?;
    let (ast, visit, index) = result.model()?;
    let node = node_at(ast, visit, position)?;

    // Cursor on a declaration's own name.
    if let Some(decl) = index.declaration_at(node) {
        if decl.selection_range.contains(position) {
            return Some((decl.handle.clone(), decl.clone()));
        }
    }

    // A reference edge recorded for this node, or any edge whose name range
    // covers the position (method names inside call nodes).
    let edge = index
        .references
        .iter()
        .find(|e| e.node == node && e.range.contains(position))
        .or_else(|| index.references.iter().find(|e| e.range.contains(position)));
    if let Some(edge) = edge {
        if let Some(decl) = declaration_for(cache, &edge.target) {
            return Some((edge.target.clone(), decl));
        }
    }

    // Fall back to the enclosing declaration (cursor in a signature).
    let mut current = node;
    for _ in 0..8 {
        if let Some(decl) = index.declaration_at(current) {
            return Some((decl.handle.clone(), decl.clone()));
        }
        current = visit.parent(current)?;
    }
    None
}

/// Looks a handle up in its owning document's cached index.
pub fn declaration_for(cache: &CompilationCache, handle: &SymbolHandle) -> Option<Declaration> {
    let result = cache.get_any(&handle.uri)?;
    let index = result.index.as_ref()?;
    index.declaration_at(handle.node).cloned()
}

/// Class catalog assembled from every cached document.
pub fn catalog_from_cache(cache: &CompilationCache) -> ClassCatalog {
    let mut catalog = ClassCatalog::new();
    for uri in cache.cached_uris() {
        if let Some(result) = cache.get_any(&uri) {
            if let Some((ast, _, _)) = result.model() {
                catalog.add_module(&uri, ast);
            }
        }
    }
    catalog
}
