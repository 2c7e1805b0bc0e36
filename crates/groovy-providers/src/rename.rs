//! Rename refactoring: validation, edit generation, file renames.

use crate::error::{CancellationToken, ProviderError, codes};
use crate::items::{FileRename, TextEdit, WorkspaceEdit};
use crate::references::collect_reference_locations;
use crate::resolve::{WorkspaceView, resolve_at};
use groovy_analysis::DeclarationKind;
use groovy_compilation::CompilationCache;
use groovy_position::Position;
use url::Url;

/// Renames the symbol at the position. All failures are structured errors
/// with stable codes; a successful result contains one text edit per
/// reference location and, for a top-level class whose file name matches
/// the class name, a file rename aligning the two.
pub fn rename(
    cache: &CompilationCache,
    workspace: &WorkspaceView,
    uri: &Url,
    position: Position,
    new_name: &str,
    token: &CancellationToken,
) -> Result<WorkspaceEdit, ProviderError> {
    token.checkpoint()?;
    validate_new_name(new_name)?;

    let Some((handle, decl)) = resolve_at(cache, uri, position) else {
        return Err(ProviderError::invalid(
            codes::NOT_RENAMEABLE,
            "no renameable symbol at this position",
        ));
    };
    if !workspace.owns(&handle.uri) {
        return Err(ProviderError::invalid(
            codes::TARGET_IN_DEPENDENCY,
            format!("'{}' is declared in a dependency and cannot be renamed", decl.name),
        ));
    }

    let mut locations = collect_reference_locations(cache, &handle, token)?;
    locations.insert(crate::items::Location {
        uri: handle.uri.clone(),
        range: decl.selection_range,
    });

    let mut edit = WorkspaceEdit::default();
    for location in locations {
        edit.push(location.uri, TextEdit { range: location.range, new_text: new_name.to_string() });
    }
    // Apply bottom-up within a document.
    for edits in edit.changes.values_mut() {
        edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));
    }

    if matches!(
        decl.kind,
        DeclarationKind::Class | DeclarationKind::Interface | DeclarationKind::Enum | DeclarationKind::Trait
    ) && decl.container.is_none()
    {
        if let Some(file_rename) = class_file_rename(&handle.uri, &decl.name, new_name) {
            edit.file_renames.push(file_rename);
        }
    }
    Ok(edit)
}

/// `[A-Za-z_][A-Za-z0-9_]*`, and not a Groovy keyword.
fn validate_new_name(new_name: &str) -> Result<(), ProviderError> {
    let mut chars = new_name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !head_ok || !tail_ok {
        return Err(ProviderError::invalid(
            codes::INVALID_NAME,
            format!("'{new_name}' is not a valid identifier"),
        ));
    }
    if groovy_lexer::is_keyword(new_name) {
        return Err(ProviderError::invalid(
            codes::KEYWORD_NAME,
            format!("'{new_name}' is a Groovy keyword"),
        ));
    }
    Ok(())
}

/// The file rename when a top-level class's file is named after it.
fn class_file_rename(uri: &Url, old_name: &str, new_name: &str) -> Option<FileRename> {
    let file_name = uri.path_segments()?.next_back()?.to_string();
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem != old_name {
        return None;
    }
    let mut new_uri = uri.clone();
    {
        let mut segments = new_uri.path_segments_mut().ok()?;
        segments.pop();
        segments.push(&format!("{new_name}.{extension}"));
    }
    Some(FileRename { old_uri: uri.clone(), new_uri })
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_parser::ParseRequest;
    use groovy_test_support::{must, must_err, must_some};
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
    fn renames_local_variable_with_both_occurrences() {
        let cache = seeded(&[("/a.groovy", "def greeting = \"hi\"\nprintln greeting\n")]);
        let uri = must(Url::parse("file:///a.groovy"));
        let edit = must(rename(
            &cache,
            &WorkspaceView::default(),
            &uri,
            Position::new(1, 8),
            "msg",
            &CancellationToken::new(),
        ));
        let edits = must_some(edit.changes.get(&uri)).clone();
        assert_eq!(edits.len(), 2);
        // Sorted bottom-up for application.
        assert_eq!(edits[0].range.start, Position::new(1, 8));
        assert_eq!(edits[0].range.end, Position::new(1, 16));
        assert_eq!(edits[1].range.start, Position::new(0, 4));
        assert_eq!(edits[1].range.end, Position::new(0, 12));
        assert!(edits.iter().all(|e| e.new_text == "msg"));
        assert!(edit.file_renames.is_empty());
    }

    #[test]
    fn rejects_invalid_and_keyword_names() {
        let cache = seeded(&[("/a.groovy", "def x = 1\n")]);
        let uri = must(Url::parse("file:///a.groovy"));
        let at = Position::new(0, 4);
        for bad in ["", "1abc", "has-dash", "a b"] {
            let err = must_err(rename(
                &cache,
                &WorkspaceView::default(),
                &uri,
                at,
                bad,
                &CancellationToken::new(),
            ));
            assert!(matches!(
                err,
                ProviderError::InvalidRequest { code: codes::INVALID_NAME, .. }
            ));
        }
        let err = must_err(rename(
            &cache,
            &WorkspaceView::default(),
            &uri,
            at,
            "class",
            &CancellationToken::new(),
        ));
        assert!(matches!(err, ProviderError::InvalidRequest { code: codes::KEYWORD_NAME, .. }));
    }

    #[test]
    fn refuses_rename_into_dependency() {
        let cache = seeded(&[
            ("/deps/Lib.groovy", "class Lib { static go() { } }\n"),
            ("/src/app.groovy", "Lib.go()\n"),
        ]);
        let workspace = WorkspaceView {
            root: Some(must(Url::parse("file:///src/"))),
            classpath: vec![must(Url::parse("file:///deps/"))],
        };
        let app = must(Url::parse("file:///src/app.groovy"));
        let err = must_err(rename(
            &cache,
            &workspace,
            &app,
            Position::new(0, 5),
            "run",
            &CancellationToken::new(),
        ));
        assert!(matches!(
            err,
            ProviderError::InvalidRequest { code: codes::TARGET_IN_DEPENDENCY, .. }
        ));
    }

    #[test]
    fn top_level_class_rename_includes_file_rename() {
        let cache = seeded(&[
            ("/src/Widget.groovy", "class Widget { }\n"),
            ("/src/use.groovy", "def w = new Widget()\n"),
        ]);
        let uri = must(Url::parse("file:///src/Widget.groovy"));
        let edit = must(rename(
            &cache,
            &WorkspaceView::default(),
            &uri,
            Position::new(0, 7),
            "Gadget",
            &CancellationToken::new(),
        ));
        assert_eq!(edit.file_renames.len(), 1);
        assert_eq!(edit.file_renames[0].new_uri.as_str(), "file:///src/Gadget.groovy");
        // Declaration plus the constructor reference in use.groovy.
        assert_eq!(edit.edit_count(), 2);
    }
}
