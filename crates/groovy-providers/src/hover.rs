//! Hover: a markdown card for the symbol at the cursor.

use crate::error::{CancellationToken, ProviderError};
use crate::items::Hover;
use crate::resolve::resolve_at;
use groovy_analysis::{Declaration, DeclarationKind};
use groovy_compilation::CompilationCache;
use groovy_position::Position;
use std::sync::Arc;
use url::Url;

/// Documentation source for a resolved declaration. Providers run in
/// priority order; the first non-`None` answer wins.
pub trait DocumentationProvider: Send + Sync {
    fn documentation(&self, decl: &Declaration, source: Option<&str>) -> Option<String>;
}

/// Extracts the Groovydoc block (`/** ... */`) ending on the line above
/// the declaration.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroovydocProvider;

impl DocumentationProvider for GroovydocProvider {
    fn documentation(&self, decl: &Declaration, source: Option<&str>) -> Option<String> {
        let source = source?;
        let decl_line = decl.range.start.line as usize;
        let lines: Vec<&str> = source.lines().collect();
        if decl_line == 0 || decl_line > lines.len() {
            return None;
        }
        // The block must end directly above the declaration.
        let above = lines.get(decl_line - 1)?.trim();
        if !above.ends_with("*/") {
            return None;
        }
        let mut collected = Vec::new();
        for line in lines[..decl_line].iter().rev() {
            let trimmed = line.trim();
            collected.push(trimmed);
            if trimmed.starts_with("/**") {
                let text = collected
                    .iter()
                    .rev()
                    .map(|l| {
                        l.trim_start_matches("/**")
                            .trim_end_matches("*/")
                            .trim_start_matches('*')
                            .trim()
                    })
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                return if text.is_empty() { None } else { Some(text) };
            }
            if !trimmed.starts_with('*') && !trimmed.ends_with("*/") {
                break;
            }
        }
        None
    }
}

/// Renders the markdown hover for the declaration under the cursor.
pub fn hover(
    cache: &CompilationCache,
    doc_providers: &[Arc<dyn DocumentationProvider>],
    uri: &Url,
    position: Position,
    source_of: impl Fn(&Url) -> Option<String>,
    token: &CancellationToken,
) -> Result<Option<Hover>, ProviderError> {
    token.checkpoint()?;
    let Some((handle, decl)) = resolve_at(cache, uri, position) else {
        return Ok(None);
    };

    let mut contents = format!("```groovy\n{}\n```", signature_of(&decl));
    if let Some(container) = &decl.container {
        contents.push_str(&format!("\n\nMember of `{container}`"));
    }
    let declaring_source = source_of(&handle.uri);
    for provider in doc_providers {
        if let Some(doc) = provider.documentation(&decl, declaring_source.as_deref()) {
            contents.push_str("\n\n---\n\n");
            contents.push_str(&doc);
            break;
        }
    }
    Ok(Some(Hover { contents, range: Some(decl.selection_range) }))
}

/// One-line signature rendering, kind-specific.
pub fn signature_of(decl: &Declaration) -> String {
    let modifiers = decl.modifiers.render();
    let prefix = if modifiers.is_empty() { String::new() } else { format!("{modifiers} ") };
    match decl.kind {
        DeclarationKind::Class => format!("{prefix}class {}", decl.name),
        DeclarationKind::Interface => format!("{prefix}interface {}", decl.name),
        DeclarationKind::Enum => format!("{prefix}enum {}", decl.name),
        DeclarationKind::Trait => format!("{prefix}trait {}", decl.name),
        DeclarationKind::Method | DeclarationKind::Constructor => {
            let ret = decl.type_name.clone().unwrap_or_else(|| "def".to_string());
            format!("{prefix}{ret} {}({} parameter{})",
                decl.name,
                decl.arity.unwrap_or(0),
                if decl.arity == Some(1) { "" } else { "s" })
        }
        DeclarationKind::Field | DeclarationKind::Property => {
            let ty = decl.type_name.clone().unwrap_or_else(|| "def".to_string());
            format!("{prefix}{ty} {}", decl.name)
        }
        DeclarationKind::Parameter => {
            let ty = decl.type_name.clone().unwrap_or_else(|| "def".to_string());
            format!("{ty} {} (parameter)", decl.name)
        }
        DeclarationKind::LocalVariable => format!("def {}", decl.name),
        DeclarationKind::Import => {
            format!("import {}", decl.type_name.clone().unwrap_or_else(|| decl.name.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_parser::ParseRequest;
    use groovy_test_support::{must, must_some};

    fn seeded(content: &str) -> (CompilationCache, Url, String) {
        let cache = CompilationCache::new(8);
        let uri = must(Url::parse("file:///h.groovy"));
        cache.compile(&ParseRequest::new(uri.clone(), content));
        (cache, uri, content.to_string())
    }

    #[test]
    fn hover_renders_signature_markdown() {
        let (cache, uri, text) = seeded("class T {\n  static int count = 0\n}\n");
        let result = must(hover(
            &cache,
            &[],
            &uri,
            Position::new(1, 13),
            |_| Some(text.clone()),
            &CancellationToken::new(),
        ));
        let hover = must_some(result);
        assert!(hover.contents.contains("```groovy"));
        assert!(hover.contents.contains("static"), "{}", hover.contents);
        assert!(hover.contents.contains("count"));
        assert!(hover.contents.contains("Member of `T`"));
    }

    #[test]
    fn groovydoc_block_is_attached() {
        let source = "/**\n * Says hello.\n */\ndef greet() { }\ngreet()\n";
        let (cache, uri, text) = seeded(source);
        // `def greet() { }` at top level parses as a method of the script
        // body; hover on the call site.
        let result = must(hover(
            &cache,
            &[Arc::new(GroovydocProvider)],
            &uri,
            Position::new(3, 5),
            |_| Some(text.clone()),
            &CancellationToken::new(),
        ));
        let hover = must_some(result);
        assert!(hover.contents.contains("Says hello."), "{}", hover.contents);
    }

    #[test]
    fn unresolvable_position_hovers_nothing() {
        let (cache, uri, _) = seeded("def x = 1\n");
        let result = must(hover(
            &cache,
            &[],
            &uri,
            Position::new(0, 8),
            |_| None,
            &CancellationToken::new(),
        ));
        assert!(result.is_none());
    }
}
