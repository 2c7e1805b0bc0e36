//! Context-aware code completion.
//!
//! The buffer at the cursor is usually not parseable, so completion makes
//! it parseable: a distinctive sentinel identifier is spliced in at the
//! cursor, the synthetic buffer is compiled transiently (never cached),
//! and the AST shape around the sentinel classifies the cursor context —
//! member access, type parameter, or top level. Candidates are then read
//! from the symbol index, the class catalog, the GDK table, and (for
//! pipeline files) the Jenkins metadata provider.

use crate::error::{CancellationToken, ProviderError};
use crate::gdk::GdkProvider;
use crate::items::{CompletionItem, CompletionItemKind};
use crate::jenkins::{JenkinsFileClassifier, JenkinsMetadataProvider, NoJenkinsMetadata};
use crate::resolve::catalog_from_cache;
use groovy_analysis::{
    ClassCatalog, DeclarationKind, ModuleVisit, SymbolIndex, TypeInferencer, raw_type,
    receiver_class_name,
};
use groovy_ast::{ModuleAst, NodeId, NodeKind};
use groovy_compilation::{CompilationCache, ParseResult};
use groovy_parser::ParseRequest;
use groovy_position::{Position, position_to_offset};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// The reserved identifier spliced at the cursor. Distinctive enough that
/// no real buffer contains it.
pub const COMPLETION_SENTINEL: &str = "__LSP_COMPLETION_ANCHOR__";

/// Cap for type-parameter candidate lists.
pub const DEFAULT_TYPE_PARAMETER_LIMIT: usize = 20;

/// Keywords offered in top-level contexts.
const COMPLETION_KEYWORDS: &[&str] = &[
    "assert", "boolean", "break", "case", "catch", "class", "continue", "def", "double", "else",
    "enum", "extends", "false", "final", "finally", "for", "if", "implements", "import", "in",
    "instanceof", "int", "interface", "long", "new", "null", "package", "private", "protected",
    "public", "return", "static", "super", "switch", "this", "throw", "trait", "true", "try",
    "void", "while",
];

/// Types offered in type-parameter position besides workspace classes.
const WELL_KNOWN_TYPES: &[&str] = &[
    "BigDecimal", "Boolean", "Double", "Integer", "List", "Long", "Map", "Object", "Set",
    "String",
];

/// How the cursor context was classified from the sentinel's AST shape.
enum CursorContext {
    TopLevel { anchor: Option<NodeId> },
    MemberAccess { object: NodeId },
    TypeParameter { prefix: String },
}

struct Speculative {
    result: ParseResult,
    context: CursorContext,
}

pub struct CompletionProvider {
    gdk: Arc<dyn GdkProvider>,
    jenkins: Arc<dyn JenkinsMetadataProvider>,
    classifier: JenkinsFileClassifier,
    type_parameter_limit: usize,
}

impl CompletionProvider {
    pub fn new(gdk: Arc<dyn GdkProvider>) -> Self {
        Self {
            gdk,
            jenkins: Arc::new(NoJenkinsMetadata),
            classifier: JenkinsFileClassifier::default_patterns(),
            type_parameter_limit: DEFAULT_TYPE_PARAMETER_LIMIT,
        }
    }

    pub fn with_jenkins(
        mut self,
        provider: Arc<dyn JenkinsMetadataProvider>,
        classifier: JenkinsFileClassifier,
    ) -> Self {
        self.jenkins = provider;
        self.classifier = classifier;
        self
    }

    pub fn with_type_parameter_limit(mut self, limit: usize) -> Self {
        self.type_parameter_limit = limit.max(1);
        self
    }

    /// Completion items for the position, broadest set first — clients
    /// apply their own prefix filtering.
    pub fn complete(
        &self,
        cache: &CompilationCache,
        uri: &Url,
        position: Position,
        text: &str,
        workspace_sources: &[(Url, String)],
        token: &CancellationToken,
    ) -> Result<Vec<CompletionItem>, ProviderError> {
        token.checkpoint()?;
        let offset = position_to_offset(text, position);
        let word_start = word_start_before(text, offset);

        // Speculative buffer one: sentinel alone at the cursor.
        let spliced = splice(text, offset, offset, COMPLETION_SENTINEL);
        let mut speculative = self.speculate(cache, uri, &spliced, workspace_sources);

        // Retry: `def ` ahead of the current word makes bare identifiers in
        // class bodies and statement positions parse as declarations.
        if speculative.is_none() {
            let retried = format!(
                "{}def {}{}{}",
                &text[..word_start],
                &text[word_start..offset],
                COMPLETION_SENTINEL,
                &text[offset..]
            );
            speculative = self.speculate(cache, uri, &retried, workspace_sources);
        }

        token.checkpoint()?;

        let mut catalog = catalog_from_cache(cache);
        for (source_uri, content) in workspace_sources {
            if cache.get_any(source_uri).is_none() {
                let neighbor = ParseRequest::new(source_uri.clone(), content.clone());
                if let Some(ast) = groovy_parser::parse(&neighbor).ast {
                    catalog.add_module(source_uri, &ast);
                }
            }
        }

        // Prefer the baseline parse when the splice made things worse.
        let baseline = cache.get_any(uri);
        let speculative = match speculative {
            Some(spec) => {
                let baseline_count =
                    baseline.as_ref().map(|b| b.diagnostics.len()).unwrap_or(usize::MAX);
                if spec.result.diagnostics.len() > baseline_count {
                    debug!(uri = %uri, "sentinel splice regressed diagnostics, using baseline");
                    None
                } else {
                    Some(spec)
                }
            }
            None => None,
        };

        let mut items = Vec::new();
        match speculative {
            Some(Speculative { result, context }) => {
                let Some((ast, visit, index)) = result.model() else {
                    return Ok(self.keyword_items());
                };
                catalog.add_module(uri, ast);
                match context {
                    CursorContext::MemberAccess { object } => {
                        self.emit_members(&mut items, ast, visit, &catalog, object);
                    }
                    CursorContext::TypeParameter { prefix } => {
                        self.emit_type_parameters(&mut items, &catalog, &prefix);
                    }
                    CursorContext::TopLevel { anchor } => {
                        self.emit_top_level(
                            &mut items, ast, visit, index, &catalog, position, anchor,
                        );
                        self.emit_jenkins(&mut items, uri, ast, visit, anchor);
                    }
                }
            }
            None => {
                // Baseline fallback: top-level scope derived from the last
                // good parse.
                if let Some(result) = baseline.as_ref() {
                    if let Some((ast, visit, index)) = result.model() {
                        let anchor = groovy_analysis::node_at(ast, visit, position);
                        self.emit_top_level(
                            &mut items, ast, visit, index, &catalog, position, anchor,
                        );
                        self.emit_jenkins(&mut items, uri, ast, visit, anchor);
                    } else {
                        items = self.keyword_items();
                    }
                } else {
                    items = self.keyword_items();
                }
            }
        }

        items.retain(|item| !item.label.contains(COMPLETION_SENTINEL));
        dedup_and_sort(&mut items);
        Ok(items)
    }

    fn speculate(
        &self,
        cache: &CompilationCache,
        uri: &Url,
        content: &str,
        workspace_sources: &[(Url, String)],
    ) -> Option<Speculative> {
        let request = ParseRequest::new(uri.clone(), content)
            .with_workspace_sources(workspace_sources.to_vec());
        let result = cache.compile_transient(&request);
        let context = {
            let (ast, visit, _) = result.model()?;
            classify(ast, visit)?
        };
        Some(Speculative { result, context })
    }

    fn keyword_items(&self) -> Vec<CompletionItem> {
        COMPLETION_KEYWORDS
            .iter()
            .map(|kw| CompletionItem::new(*kw, CompletionItemKind::Keyword).with_sort_group(7))
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_top_level(
        &self,
        items: &mut Vec<CompletionItem>,
        ast: &ModuleAst,
        visit: &ModuleVisit,
        index: &SymbolIndex,
        catalog: &ClassCatalog,
        position: Position,
        anchor: Option<NodeId>,
    ) {
        let cursor_method = anchor.and_then(|node| visit.enclosing_method(ast, node));

        // Locals and parameters declared before the cursor in the same
        // method (or the script body when neither is in a method).
        for decl in &index.declarations {
            let visible = match decl.kind {
                DeclarationKind::LocalVariable | DeclarationKind::Parameter => {
                    decl.selection_range.start <= position
                        && visit.enclosing_method(ast, decl.handle.node) == cursor_method
                }
                _ => false,
            };
            if !visible {
                continue;
            }
            items.push(
                CompletionItem::new(&decl.name, CompletionItemKind::Variable)
                    .with_detail(decl.type_name.clone().unwrap_or_else(|| "def".to_string()))
                    .with_sort_group(0),
            );
        }

        // Members of the enclosing class.
        if let Some(class) = anchor.and_then(|node| visit.enclosing_class(ast, node)) {
            if let Some(members) = index.members_of(class) {
                for idx in
                    members.fields.iter().chain(&members.properties).chain(&members.methods)
                {
                    let decl = index.declaration(*idx);
                    let kind = match decl.kind {
                        DeclarationKind::Method => CompletionItemKind::Method,
                        DeclarationKind::Constructor => CompletionItemKind::Constructor,
                        DeclarationKind::Field => CompletionItemKind::Field,
                        _ => CompletionItemKind::Property,
                    };
                    items.push(
                        CompletionItem::new(&decl.name, kind)
                            .with_detail(
                                decl.type_name.clone().unwrap_or_else(|| "def".to_string()),
                            )
                            .with_sort_group(1),
                    );
                }
            }
        }

        // Workspace classes and imported names.
        for class in catalog.classes().filter(|c| !c.synthetic) {
            items.push(
                CompletionItem::new(&class.name, CompletionItemKind::Class)
                    .with_detail(class.qualified_name())
                    .with_sort_group(4),
            );
        }
        for decl in &index.declarations {
            if decl.kind == DeclarationKind::Import {
                items.push(
                    CompletionItem::new(&decl.name, CompletionItemKind::Class)
                        .with_detail(decl.type_name.clone().unwrap_or_default())
                        .with_sort_group(4),
                );
            }
        }

        items.extend(self.keyword_items());
    }

    fn emit_members(
        &self,
        items: &mut Vec<CompletionItem>,
        ast: &ModuleAst,
        visit: &ModuleVisit,
        catalog: &ClassCatalog,
        object: NodeId,
    ) {
        let inferencer = TypeInferencer::new(ast, visit);
        let Some(receiver) =
            receiver_class_name(ast, visit, catalog, &inferencer, Some(object), object)
        else {
            // No resolvable receiver class: keywords only.
            items.extend(self.keyword_items());
            return;
        };
        let receiver = raw_type(&receiver).to_string();
        let static_receiver = matches!(
            ast.kind(object),
            NodeKind::Variable { name, accessed_variable: None } if *name == receiver
        );

        // Declared members, walking supertypes through the catalog.
        let mut class_name = Some(receiver.clone());
        for _ in 0..8 {
            let Some(class) = class_name.as_deref().and_then(|n| catalog.class_named(n)) else {
                break;
            };
            for member in class.properties.iter().chain(&class.fields).chain(&class.methods) {
                if static_receiver && !member.modifiers.is_static {
                    continue;
                }
                let (kind, detail) = match member.arity {
                    Some(_) => (
                        CompletionItemKind::Method,
                        format!(
                            "{}({})",
                            member.name,
                            member.parameters.join(", ")
                        ),
                    ),
                    None => (
                        CompletionItemKind::Property,
                        member.type_name.clone().unwrap_or_else(|| "def".to_string()),
                    ),
                };
                items.push(
                    CompletionItem::new(&member.name, kind).with_detail(detail).with_sort_group(1),
                );
            }
            class_name = class.superclass.clone();
        }

        // GDK decorations for instance receivers.
        if !static_receiver {
            for method in
                self.gdk.methods_for(&receiver).into_iter().chain(self.gdk.object_methods())
            {
                items.push(
                    CompletionItem::new(method.name, CompletionItemKind::Method)
                        .with_detail(method.signature)
                        .with_sort_group(2),
                );
            }
        }
    }

    fn emit_type_parameters(
        &self,
        items: &mut Vec<CompletionItem>,
        catalog: &ClassCatalog,
        prefix: &str,
    ) {
        let prefix_lower = prefix.to_lowercase();
        let mut names: Vec<(String, Option<String>)> = catalog
            .classes()
            .filter(|c| !c.synthetic)
            .map(|c| (c.name.clone(), Some(c.qualified_name())))
            .chain(WELL_KNOWN_TYPES.iter().map(|n| (n.to_string(), None)))
            .filter(|(name, _)| {
                prefix_lower.is_empty() || name.to_lowercase().starts_with(&prefix_lower)
            })
            .collect();
        names.sort();
        names.dedup_by(|a, b| a.0 == b.0);
        for (name, qualified) in names.into_iter().take(self.type_parameter_limit) {
            let mut item = CompletionItem::new(name, CompletionItemKind::Class).with_sort_group(4);
            if let Some(qualified) = qualified {
                item = item.with_detail(qualified);
            }
            items.push(item);
        }
    }

    fn emit_jenkins(
        &self,
        items: &mut Vec<CompletionItem>,
        uri: &Url,
        ast: &ModuleAst,
        visit: &ModuleVisit,
        anchor: Option<NodeId>,
    ) {
        if !self.classifier.is_jenkins_file(uri) {
            return;
        }
        for global in self.jenkins.global_variables() {
            let mut item = CompletionItem::new(&global.name, CompletionItemKind::Variable)
                .with_detail(global.type_name.clone())
                .with_sort_group(3);
            item.documentation = global.documentation.clone();
            items.push(item);
        }
        // Map-key completion for keyword arguments of the enclosing step.
        let Some(anchor) = anchor else { return };
        let mut current = anchor;
        for _ in 0..16 {
            if let NodeKind::MethodCall { method, .. } = ast.kind(current) {
                if !method.contains(COMPLETION_SENTINEL) {
                    for parameter in self.jenkins.step_parameters(method) {
                        let mut item =
                            CompletionItem::new(&parameter.name, CompletionItemKind::Property)
                                .with_detail(parameter.type_name.clone())
                                .with_sort_group(3);
                        item.insert_text = Some(format!("{}: ", parameter.name));
                        item.documentation = parameter.documentation.clone();
                        items.push(item);
                    }
                    break;
                }
            }
            match visit.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
    }
}

/// AST-shape classification of the sentinel position.
fn classify(ast: &ModuleAst, visit: &ModuleVisit) -> Option<CursorContext> {
    for id in visit.nodes.iter().copied() {
        match ast.kind(id) {
            // `expr.__ANCHOR__` — member access on the qualifier.
            NodeKind::PropertyExpr { object, property, .. } => {
                if let NodeKind::Constant { value } = ast.kind(*property) {
                    if value.as_str().is_some_and(|s| s.contains(COMPLETION_SENTINEL)) {
                        return Some(CursorContext::MemberAccess { object: *object });
                    }
                }
            }
            // `expr.part__ANCHOR__()` — a call whose name swallowed the
            // sentinel.
            NodeKind::MethodCall { object: Some(object), method, .. }
                if method.contains(COMPLETION_SENTINEL) =>
            {
                return Some(CursorContext::MemberAccess { object: *object });
            }
            // `List<Str__ANCHOR__` parses as `List < Str__ANCHOR__`.
            NodeKind::Variable { name, .. } if name.contains(COMPLETION_SENTINEL) => {
                if let Some(parent) = visit.parent(id) {
                    if let NodeKind::BinaryExpr { op, right, .. } = ast.kind(parent) {
                        if op == "<" && *right == id {
                            let prefix = name
                                .split(COMPLETION_SENTINEL)
                                .next()
                                .unwrap_or("")
                                .to_string();
                            return Some(CursorContext::TypeParameter { prefix });
                        }
                    }
                }
                return Some(CursorContext::TopLevel { anchor: Some(id) });
            }
            // A declared type that captured the sentinel:
            // `List<__ANCHOR__> x` or `Foo__ANCHOR__ x`.
            NodeKind::VariableDeclaration { type_name: Some(spec), .. }
            | NodeKind::Field { type_name: Some(spec), .. }
            | NodeKind::Property { type_name: Some(spec), .. }
            | NodeKind::Parameter { type_name: Some(spec), .. }
                if spec.contains(COMPLETION_SENTINEL) =>
            {
                let prefix = type_parameter_prefix(spec);
                return Some(CursorContext::TypeParameter { prefix });
            }
            // A declaration name that swallowed the sentinel (the `def `
            // retry shape).
            NodeKind::Field { name, .. }
            | NodeKind::Property { name, .. }
            | NodeKind::Method { name, .. }
                if name.contains(COMPLETION_SENTINEL) =>
            {
                return Some(CursorContext::TopLevel { anchor: Some(id) });
            }
            _ => {}
        }
    }
    None
}

/// The user's partial type name before the sentinel inside a generic
/// spelling: `List<Str__A__>` → `Str`.
fn type_parameter_prefix(spec: &str) -> String {
    let before_sentinel = spec.split(COMPLETION_SENTINEL).next().unwrap_or("");
    before_sentinel
        .rsplit(|c: char| c == '<' || c == ',' || c == ' ')
        .next()
        .unwrap_or("")
        .to_string()
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn word_start_before(text: &str, offset: usize) -> usize {
    let mut start = offset.min(text.len());
    while start > 0 {
        let Some(prev) = text[..start].chars().next_back() else { break };
        if is_identifier_char(prev) {
            start -= prev.len_utf8();
        } else {
            break;
        }
    }
    start
}

fn splice(text: &str, start: usize, end: usize, insert: &str) -> String {
    let mut out = String::with_capacity(text.len() + insert.len());
    out.push_str(&text[..start]);
    out.push_str(insert);
    out.push_str(&text[end..]);
    out
}

fn dedup_and_sort(items: &mut Vec<CompletionItem>) {
    let mut seen: HashSet<(String, CompletionItemKind)> = HashSet::new();
    items.retain(|item| seen.insert((item.label.clone(), item.kind)));
    items.sort_by(|a, b| {
        let ka = a.sort_text.as_deref().unwrap_or(&a.label);
        let kb = b.sort_text.as_deref().unwrap_or(&b.label);
        ka.cmp(kb)
    });
}
