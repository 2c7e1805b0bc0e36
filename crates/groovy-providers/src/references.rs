//! Find-all-references across every cached document.

use crate::error::{CancellationToken, ProviderError};
use crate::items::Location;
use crate::resolve::resolve_at;
use groovy_analysis::SymbolHandle;
use groovy_compilation::CompilationCache;
use groovy_position::Position;
use std::collections::HashSet;
use url::Url;

/// All reference locations whose edge targets the declaration resolved at
/// the position. Deduplicated by (uri, range); the declaration's own
/// location is included on request. Cancellation is checked per scanned
/// file.
pub fn references(
    cache: &CompilationCache,
    uri: &Url,
    position: Position,
    include_declaration: bool,
    token: &CancellationToken,
) -> Result<Vec<Location>, ProviderError> {
    token.checkpoint()?;
    let Some((handle, decl)) = resolve_at(cache, uri, position) else {
        return Ok(Vec::new());
    };
    let mut locations = collect_reference_locations(cache, &handle, token)?;
    if include_declaration {
        locations.insert(Location { uri: handle.uri.clone(), range: decl.selection_range });
    } else {
        locations.remove(&Location { uri: handle.uri.clone(), range: decl.selection_range });
    }
    let mut ordered: Vec<Location> = locations.into_iter().collect();
    ordered.sort_by(|a, b| {
        (a.uri.as_str(), a.range.start).cmp(&(b.uri.as_str(), b.range.start))
    });
    Ok(ordered)
}

/// Scan of every cached index for edges to `target`.
pub fn collect_reference_locations(
    cache: &CompilationCache,
    target: &SymbolHandle,
    token: &CancellationToken,
) -> Result<HashSet<Location>, ProviderError> {
    let mut locations = HashSet::new();
    for scanned in cache.cached_uris() {
        token.checkpoint()?;
        let Some(result) = cache.get_any(&scanned) else { continue };
        let Some(index) = result.index.as_ref() else { continue };
        for edge in index.references_to(target) {
            locations.insert(Location { uri: scanned.clone(), range: edge.range });
        }
    }
    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_parser::ParseRequest;
    use groovy_test_support::must;
    use pretty_assertions::assert_eq;

    fn seeded(files: &[(&str, &str)]) -> CompilationCache {
        let cache = CompilationCache::new(16);
        let sources: Vec<(Url, String)> = files
            .iter()
            .map(|(p, c)| (must(Url::parse(&format!("file://{p}"))), c.to_string()))
            .collect();
        for (uri, content) in &sources {
            let others: Vec<(Url, String)> =
                sources.iter().filter(|(u, _)| u != uri).cloned().collect();
            cache.compile(
                &ParseRequest::new(uri.clone(), content.clone()).with_workspace_sources(others),
            );
        }
        cache
    }

    #[test]
    fn local_variable_references_include_declaration_on_request() {
        let cache = seeded(&[("/a.groovy", "def greeting = \"hi\"\nprintln greeting\n")]);
        let uri = must(Url::parse("file:///a.groovy"));
        let with_decl = must(references(
            &cache,
            &uri,
            Position::new(0, 6),
            true,
            &CancellationToken::new(),
        ));
        assert_eq!(with_decl.len(), 2);
        assert_eq!(with_decl[0].range.start, Position::new(0, 4));
        assert_eq!(with_decl[1].range.start, Position::new(1, 8));

        let without_decl = must(references(
            &cache,
            &uri,
            Position::new(0, 6),
            false,
            &CancellationToken::new(),
        ));
        assert_eq!(without_decl.len(), 1);
        assert_eq!(without_decl[0].range.start, Position::new(1, 8));
    }

    #[test]
    fn static_property_references_span_files() {
        let cache = seeded(&[
            ("/m.groovy", "class M { static val = 1 }\n"),
            ("/u1.groovy", "println M.val\n"),
            ("/u2.groovy", "def x = M.val + 1\n"),
        ]);
        let m = must(Url::parse("file:///m.groovy"));
        // On `val` in the declaration: line 0, cols 17..20.
        let locations = must(references(
            &cache,
            &m,
            Position::new(0, 18),
            true,
            &CancellationToken::new(),
        ));
        assert_eq!(locations.len(), 3, "declaration plus two usages: {locations:?}");
        let uris: HashSet<&str> = locations.iter().map(|l| l.uri.as_str()).collect();
        assert_eq!(uris.len(), 3);
    }

    #[test]
    fn cancellation_mid_scan_returns_cancelled() {
        let cache = seeded(&[("/a.groovy", "def x = 1\nx + x\n")]);
        let uri = must(Url::parse("file:///a.groovy"));
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            references(&cache, &uri, Position::new(0, 4), true, &token),
            Err(ProviderError::Cancelled)
        );
    }
}
