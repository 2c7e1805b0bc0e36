//! AST analysis for the Groovy analyzer core: relationship tracking,
//! cross-file class catalogs, the per-document symbol index, and minimal
//! type inference.
//!
//! Everything here is immutable once built — a [`ModuleVisit`] and
//! [`SymbolIndex`] are constructed in one pass after parsing and then only
//! read, so providers share them without locking.

mod catalog;
mod symbols;
mod types;
mod visitor;

pub use catalog::{ClassCatalog, ClassSummary, MemberSummary};
pub use symbols::{
    ClassMemberIndices, Declaration, DeclarationKind, ReferenceEdge, SymbolHandle, SymbolIndex,
    build_index, receiver_class_name,
};
pub use types::{TypeInferencer, boxed, raw_type};
pub use visitor::{ModuleVisit, node_at, visit_module};
