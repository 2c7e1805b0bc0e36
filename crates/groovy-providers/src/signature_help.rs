//! Signature help for the innermost enclosing method call.

use crate::error::{CancellationToken, ProviderError};
use crate::items::{SignatureHelp, SignatureInformation};
use crate::resolve::catalog_from_cache;
use groovy_analysis::{TypeInferencer, node_at, raw_type, receiver_class_name};
use groovy_ast::NodeKind;
use groovy_compilation::CompilationCache;
use groovy_position::Position;
use url::Url;

/// Overloads of the call surrounding the cursor, with the active parameter
/// taken from the argument the cursor sits in. Empty when the cursor is
/// not inside a resolvable call.
pub fn signature_help(
    cache: &CompilationCache,
    uri: &Url,
    position: Position,
    token: &CancellationToken,
) -> Result<Option<SignatureHelp>, ProviderError> {
    token.checkpoint()?;
    let Some(result) = cache.get_any(uri) else { return Ok(None) };
    let Some((ast, visit, _)) = result.model() else { return Ok(None) };
    let Some(node) = node_at(ast, visit, position) else { return Ok(None) };

    // Walk up to the nearest method call containing the position.
    let mut current = node;
    let call = loop {
        if let NodeKind::MethodCall { .. } = ast.kind(current) {
            break current;
        }
        match visit.parent(current) {
            Some(parent) => current = parent,
            None => return Ok(None),
        }
    };
    let NodeKind::MethodCall { object, method, arguments, .. } = ast.kind(call) else {
        return Ok(None);
    };

    let catalog = catalog_from_cache(cache);
    let inferencer = TypeInferencer::new(ast, visit);
    let Some(receiver) =
        receiver_class_name(ast, visit, &catalog, &inferencer, *object, call)
    else {
        return Ok(None);
    };
    let receiver = raw_type(&receiver).to_string();
    let Some(class) = catalog.class_named(&receiver) else { return Ok(None) };

    let overloads: Vec<&groovy_analysis::MemberSummary> =
        class.methods.iter().filter(|m| &m.name == method).collect();
    if overloads.is_empty() {
        return Ok(None);
    }

    // Active parameter: the argument whose range covers the cursor, else
    // the next slot.
    let active_parameter = arguments
        .iter()
        .position(|arg| {
            ast.range(*arg)
                .to_editor()
                .is_some_and(|r| r.contains_inclusive(position))
        })
        .unwrap_or(arguments.len()) as u32;

    // Prefer the overload whose arity covers the current argument count.
    let active_signature = overloads
        .iter()
        .position(|m| m.arity.unwrap_or(0) >= arguments.len())
        .unwrap_or(0) as u32;

    let signatures = overloads
        .iter()
        .map(|m| SignatureInformation {
            label: format!("{}({})", m.name, m.parameters.join(", ")),
            parameters: m.parameters.clone(),
        })
        .collect();

    Ok(Some(SignatureHelp { signatures, active_signature, active_parameter }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_parser::ParseRequest;
    use groovy_test_support::{must, must_some};
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
    fn shows_overloads_with_active_parameter() {
        let cache = seeded(&[
            ("/lib.groovy", "class Fmt {\n  static pad(s) { s }\n  static pad(s, width) { s }\n}\n"),
            ("/use.groovy", "Fmt.pad(\"x\", 3)\n"),
        ]);
        let uri = must(Url::parse("file:///use.groovy"));
        // Cursor on the second argument.
        let help = must_some(must(signature_help(
            &cache,
            &uri,
            Position::new(0, 13),
            &CancellationToken::new(),
        )));
        assert_eq!(help.signatures.len(), 2);
        assert_eq!(help.active_parameter, 1);
        assert_eq!(help.signatures[1].label, "pad(s, width)");
    }

    #[test]
    fn no_call_means_no_help() {
        let cache = seeded(&[("/n.groovy", "def x = 1\n")]);
        let uri = must(Url::parse("file:///n.groovy"));
        let help = must(signature_help(&cache, &uri, Position::new(0, 4), &CancellationToken::new()));
        assert!(help.is_none());
    }
}
