//! Wire-facing value types the providers answer with.
//!
//! These mirror the LSP data model (0-based UTF-16 positions, half-open
//! ranges, per-URI text edits) without depending on a transport crate; the
//! embedding server converts them at its boundary.

use groovy_position::Range;
use serde::{Deserialize, Serialize};
use url::Url;

/// A range in a specific document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub uri: Url,
    pub range: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionItemKind {
    Class,
    Interface,
    Enum,
    Method,
    Constructor,
    Field,
    Property,
    Variable,
    Keyword,
    Module,
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    /// Signature or type rendering shown next to the label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Text to insert; defaults to the label when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    /// Sort group; lower sorts first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_text: Option<String>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
            insert_text: None,
            sort_text: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_sort_group(mut self, group: u8) -> Self {
        self.sort_text = Some(format!("{group:02}_{}", self.label));
        self
    }
}

/// Symbol kinds for outlines, fixed per declaration type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    Class,
    Interface,
    Enum,
    Method,
    Constructor,
    Field,
    Property,
    Variable,
    Namespace,
}

/// One node of the hierarchical document outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Full declaration extent.
    pub range: Range,
    /// The identifier alone.
    pub selection_range: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub children: Vec<DocumentSymbol>,
}

/// A flat workspace-symbol hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
}

/// A single text replacement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// A file rename accompanying a workspace edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRename {
    pub old_uri: Url,
    pub new_uri: Url,
}

/// Edits keyed by URI, optionally with file renames. Applying the text
/// edits of one document in reverse range order keeps earlier edits valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkspaceEdit {
    pub changes: std::collections::HashMap<Url, Vec<TextEdit>>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub file_renames: Vec<FileRename>,
}

impl WorkspaceEdit {
    pub fn push(&mut self, uri: Url, edit: TextEdit) {
        self.changes.entry(uri).or_default().push(edit);
    }

    pub fn edit_count(&self) -> usize {
        self.changes.values().map(Vec::len).sum()
    }
}

/// Markdown hover payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hover {
    /// Markdown content.
    pub contents: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

/// A quick fix offered for a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAction {
    pub title: String,
    /// Always `"quickfix"` for registry-produced actions.
    pub kind: String,
    pub edit: WorkspaceEdit,
    /// The diagnostic this action addresses.
    pub diagnostic: groovy_parser::Diagnostic,
}

/// One overload shown by signature help.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureInformation {
    pub label: String,
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureHelp {
    pub signatures: Vec<SignatureInformation>,
    pub active_signature: u32,
    pub active_parameter: u32,
}
