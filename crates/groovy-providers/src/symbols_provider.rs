//! Document and workspace symbol providers.

use crate::error::{CancellationToken, ProviderError};
use crate::items::{DocumentSymbol, Location, SymbolKind, WorkspaceSymbol};
use groovy_analysis::{Declaration, DeclarationKind, SymbolIndex};
use groovy_compilation::CompilationCache;
use url::Url;

/// Hard cap on workspace-symbol results.
pub const WORKSPACE_SYMBOL_LIMIT: usize = 100;

fn symbol_kind(decl: &Declaration) -> Option<SymbolKind> {
    match decl.kind {
        DeclarationKind::Class | DeclarationKind::Trait => Some(SymbolKind::Class),
        DeclarationKind::Interface => Some(SymbolKind::Interface),
        DeclarationKind::Enum => Some(SymbolKind::Enum),
        DeclarationKind::Method => Some(SymbolKind::Method),
        DeclarationKind::Constructor => Some(SymbolKind::Constructor),
        DeclarationKind::Field => Some(SymbolKind::Field),
        DeclarationKind::Property => Some(SymbolKind::Property),
        DeclarationKind::Import => Some(SymbolKind::Namespace),
        DeclarationKind::Parameter | DeclarationKind::LocalVariable => None,
    }
}

/// Hierarchical outline: imports flat, then classes with nested members
/// and inner classes. Ranges are the full declaration extent, selection
/// ranges the identifier alone.
pub fn document_symbols(
    cache: &CompilationCache,
    uri: &Url,
    token: &CancellationToken,
) -> Result<Vec<DocumentSymbol>, ProviderError> {
    token.checkpoint()?;
    let Some(result) = cache.get_any(uri) else {
        return Ok(Vec::new());
    };
    let Some((ast, visit, index)) = result.model() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for decl in &index.declarations {
        if decl.kind == DeclarationKind::Import {
            out.push(DocumentSymbol {
                name: decl.name.clone(),
                kind: SymbolKind::Namespace,
                range: decl.range,
                selection_range: decl.selection_range,
                detail: decl.type_name.clone(),
                children: Vec::new(),
            });
        }
    }
    for class in &visit.class_nodes {
        // Only top-level classes here; inner classes nest below their
        // owners.
        let is_nested = visit
            .parent(*class)
            .and_then(|p| visit.enclosing_class(ast, p))
            .is_some();
        if is_nested {
            continue;
        }
        if let Some(symbol) = class_symbol(index, *class) {
            out.push(symbol);
        }
    }
    Ok(out)
}

fn class_symbol(index: &SymbolIndex, class: groovy_ast::NodeId) -> Option<DocumentSymbol> {
    let decl = index.declaration_at(class)?;
    let members = index.members_of(class)?;
    let mut children = Vec::new();
    for idx in members
        .fields
        .iter()
        .chain(&members.properties)
        .chain(&members.methods)
    {
        let member = index.declaration(*idx);
        if let Some(kind) = symbol_kind(member) {
            children.push(DocumentSymbol {
                name: member.name.clone(),
                kind,
                range: member.range,
                selection_range: member.selection_range,
                detail: member.type_name.clone(),
                children: Vec::new(),
            });
        }
    }
    for idx in &members.inner_classes {
        let inner = index.declaration(*idx);
        if let Some(symbol) = class_symbol(index, inner.handle.node) {
            children.push(symbol);
        }
    }
    children.sort_by_key(|c| c.range.start);
    Some(DocumentSymbol {
        name: decl.name.clone(),
        kind: symbol_kind(decl)?,
        range: decl.range,
        selection_range: decl.selection_range,
        detail: None,
        children,
    })
}

/// Case-insensitive substring search over every cached document's
/// declarations, capped at a fixed limit.
pub fn workspace_symbols(
    cache: &CompilationCache,
    query: &str,
    token: &CancellationToken,
) -> Result<Vec<WorkspaceSymbol>, ProviderError> {
    let needle = query.to_lowercase();
    let mut out = Vec::new();
    for uri in cache.cached_uris() {
        token.checkpoint()?;
        let Some(result) = cache.get_any(&uri) else { continue };
        let Some(index) = result.index.as_ref() else { continue };
        for decl in &index.declarations {
            if matches!(
                decl.kind,
                DeclarationKind::Parameter | DeclarationKind::LocalVariable | DeclarationKind::Import
            ) {
                continue;
            }
            if !needle.is_empty() && !decl.name.to_lowercase().contains(&needle) {
                continue;
            }
            let Some(kind) = symbol_kind(decl) else { continue };
            out.push(WorkspaceSymbol {
                name: decl.name.clone(),
                kind,
                location: Location { uri: uri.clone(), range: decl.selection_range },
                container_name: decl.container.clone(),
            });
            if out.len() >= WORKSPACE_SYMBOL_LIMIT {
                return Ok(out);
            }
        }
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_parser::ParseRequest;
    use groovy_test_support::{must, must_some};
    use pretty_assertions::assert_eq;

    fn seeded(files: &[(&str, &str)]) -> CompilationCache {
        let cache = CompilationCache::new(16);
        for (path, content) in files {
            let uri = must(Url::parse(&format!("file://{path}")));
            cache.compile(&ParseRequest::new(uri, *content));
        }
        cache
    }

    #[test]
    fn outline_nests_members_under_classes() {
        let cache = seeded(&[(
            "/o.groovy",
            "import java.util.List\nclass Outer {\n  int size = 0\n  def grow() { }\n  class Inner { }\n}\n",
        )]);
        let uri = must(Url::parse("file:///o.groovy"));
        let symbols = must(document_symbols(&cache, &uri, &CancellationToken::new()));
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].kind, SymbolKind::Namespace);
        let outer = &symbols[1];
        assert_eq!(outer.name, "Outer");
        let names: Vec<&str> = outer.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["size", "grow", "Inner"]);
    }

    #[test]
    fn script_wrappers_do_not_appear_in_outline() {
        let cache = seeded(&[("/s.groovy", "def x = 1\nprintln x\n")]);
        let uri = must(Url::parse("file:///s.groovy"));
        let symbols = must(document_symbols(&cache, &uri, &CancellationToken::new()));
        assert!(symbols.is_empty(), "{symbols:?}");
    }

    #[test]
    fn workspace_query_is_case_insensitive_substring() {
        let cache = seeded(&[
            ("/a.groovy", "class PaymentService { def charge() { } }\n"),
            ("/b.groovy", "class PaymentGateway { }\nclass Audit { }\n"),
        ]);
        let symbols = must(workspace_symbols(&cache, "payment", &CancellationToken::new()));
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["PaymentGateway", "PaymentService"]);
        let all = must(workspace_symbols(&cache, "", &CancellationToken::new()));
        let _ = must_some(all.iter().find(|s| s.name == "charge"));
    }

    #[test]
    fn selection_range_is_identifier_only() {
        let cache = seeded(&[("/sel.groovy", "class Wide {\n  def method(a, b) { a + b }\n}\n")]);
        let uri = must(Url::parse("file:///sel.groovy"));
        let symbols = must(document_symbols(&cache, &uri, &CancellationToken::new()));
        let class = &symbols[0];
        assert!(class.range.end.line >= 2);
        assert_eq!(class.selection_range.start.character, 6);
        assert_eq!(class.selection_range.end.character, 10);
    }
}
