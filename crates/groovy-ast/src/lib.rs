//! Abstract syntax tree for the Groovy analyzer core.
//!
//! One [`ModuleAst`] arena per compiled document owns every node; everything
//! else — parent maps, symbol indices, reference edges — stores [`NodeId`]
//! indices, never aliasing references. Node kinds form a closed sum
//! ([`NodeKind`]), so traversal and classification are pattern matches
//! rather than virtual dispatch.

mod arena;
mod kind;

pub use arena::{AstNode, ModuleAst, NodeId};
pub use kind::{ClassKind, ConstantValue, Modifiers, NodeKind, Visibility};
