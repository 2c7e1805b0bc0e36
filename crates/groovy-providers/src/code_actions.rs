//! Quick-fix code actions keyed by diagnostic code.
//!
//! The registry maps a rule code to a title and a handler producing a
//! single text edit. No fixes are invented for unregistered codes, and the
//! built-in missing-import rule only offers an action when exactly one
//! candidate class exists in the workspace.

use crate::error::{CancellationToken, ProviderError};
use crate::items::{CodeAction, TextEdit, WorkspaceEdit};
use groovy_analysis::DeclarationKind;
use groovy_ast::NodeKind;
use groovy_compilation::CompilationCache;
use groovy_parser::{Diagnostic, codes};
use groovy_position::Range;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Context handed to fix handlers.
pub struct FixContext<'a> {
    pub cache: &'a CompilationCache,
    pub uri: &'a Url,
    pub text: &'a str,
}

type FixHandler = dyn Fn(&Diagnostic, &FixContext<'_>) -> Option<TextEdit> + Send + Sync;

struct FixRule {
    title: Box<dyn Fn(&Diagnostic) -> String + Send + Sync>,
    handler: Box<FixHandler>,
}

/// Rule-code → quick-fix registry.
#[derive(Default)]
pub struct QuickFixRegistry {
    rules: HashMap<String, FixRule>,
}

impl QuickFixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule set: the missing-import fix.
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        registry.register(
            codes::UNRESOLVED_CLASS,
            |diagnostic| {
                let name = unresolved_class_name(&diagnostic.message).unwrap_or_default();
                format!("Import '{name}'")
            },
            missing_import_fix,
        );
        registry
    }

    pub fn register(
        &mut self,
        code: &str,
        title: impl Fn(&Diagnostic) -> String + Send + Sync + 'static,
        handler: impl Fn(&Diagnostic, &FixContext<'_>) -> Option<TextEdit> + Send + Sync + 'static,
    ) {
        self.rules.insert(
            code.to_string(),
            FixRule { title: Box::new(title), handler: Box::new(handler) },
        );
    }

    /// Actions for the diagnostics in a range. One action at most per
    /// diagnostic, only for registered codes whose handler produced an
    /// edit.
    pub fn actions(
        &self,
        cache: &CompilationCache,
        uri: &Url,
        text: &str,
        range: Range,
        diagnostics: &[Diagnostic],
        token: &CancellationToken,
    ) -> Result<Vec<CodeAction>, ProviderError> {
        let context = FixContext { cache, uri, text };
        let mut actions = Vec::new();
        for diagnostic in diagnostics {
            token.checkpoint()?;
            if !ranges_touch(range, diagnostic.range) {
                continue;
            }
            let Some(code) = diagnostic.code.as_deref() else { continue };
            let Some(rule) = self.rules.get(code) else { continue };
            let Some(edit) = (rule.handler)(diagnostic, &context) else { continue };
            let mut workspace_edit = WorkspaceEdit::default();
            workspace_edit.push(uri.clone(), edit);
            actions.push(CodeAction {
                title: (rule.title)(diagnostic),
                kind: "quickfix".to_string(),
                edit: workspace_edit,
                diagnostic: diagnostic.clone(),
            });
        }
        Ok(actions)
    }
}

fn ranges_touch(a: Range, b: Range) -> bool {
    a.contains_range(b)
        || b.contains_range(a)
        || a.contains(b.start)
        || b.contains(a.start)
        || a.start == b.start
}

/// `unable to resolve class Xyz` → `Xyz`.
fn unresolved_class_name(message: &str) -> Option<&str> {
    message.rsplit(' ').next().filter(|s| !s.is_empty())
}

/// Adds `import pkg.Name` below existing imports (or the package line)
/// when exactly one class with that simple name exists across the cached
/// workspace.
fn missing_import_fix(diagnostic: &Diagnostic, context: &FixContext<'_>) -> Option<TextEdit> {
    let simple = unresolved_class_name(&diagnostic.message)?;

    let mut candidates: Vec<String> = Vec::new();
    for uri in context.cache.cached_uris() {
        let Some(result) = context.cache.get_any(&uri) else { continue };
        let Some((ast, _, index)) = result.model() else { continue };
        for decl in &index.declarations {
            let is_class = matches!(
                decl.kind,
                DeclarationKind::Class
                    | DeclarationKind::Interface
                    | DeclarationKind::Enum
                    | DeclarationKind::Trait
            );
            if !is_class || decl.name != simple {
                continue;
            }
            let package = ast.root().and_then(|root| match ast.kind(root) {
                NodeKind::Module { package: Some(pkg), .. } => match ast.kind(*pkg) {
                    NodeKind::Package { name } => Some(name.clone()),
                    _ => None,
                },
                _ => None,
            });
            candidates.push(match package {
                Some(pkg) => format!("{pkg}.{simple}"),
                None => simple.to_string(),
            });
        }
    }
    candidates.sort();
    candidates.dedup();
    // Ambiguous or unknown: offer nothing.
    let [qualified] = candidates.as_slice() else { return None };
    if qualified == simple {
        // Same-package class with no package prefix; an import adds
        // nothing.
        return None;
    }

    let insert_line = import_insert_line(context.cache, context.uri, context.text);
    Some(TextEdit {
        range: Range::on_line(insert_line, 0, 0),
        new_text: format!("import {qualified}\n"),
    })
}

/// Line index right after the last import, else after the package line,
/// else the top of the file.
fn import_insert_line(cache: &CompilationCache, uri: &Url, _text: &str) -> u32 {
    let Some(result) = cache.get_any(uri) else { return 0 };
    let Some((ast, _, _)) = result.model() else { return 0 };
    let Some(root) = ast.root() else { return 0 };
    let NodeKind::Module { package, imports, .. } = ast.kind(root) else { return 0 };
    let mut line = 0u32;
    if let Some(pkg) = package {
        if let Some(range) = ast.range(*pkg).to_editor() {
            line = range.end.line + 1;
        }
    }
    for import in imports {
        if let Some(range) = ast.range(*import).to_editor() {
            line = line.max(range.end.line + 1);
        }
    }
    line
}
