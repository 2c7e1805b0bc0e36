//! Position model for the Groovy analyzer core.
//!
//! Editors speak 0-based line/character pairs with characters counted in
//! UTF-16 code units; the Groovy front end speaks 1-based line/column. This
//! crate is the single conversion point between the two, plus the range
//! arithmetic (containment, size ordering) every position query builds on.

mod compiler;
mod offset;
mod position;

pub use compiler::{LineColumn, SourceRange};
pub use offset::{offset_to_position, position_to_offset};
pub use position::{Position, Range};
