//! Byte offset ↔ editor position conversion over document text.
//!
//! The completion provider splices a sentinel token into the buffer by byte
//! offset; these helpers keep that arithmetic UTF-16 correct.

use crate::Position;

/// Converts a byte offset into an editor position. Offsets past the end of
/// the text clamp to the final position; offsets inside a multi-byte
/// character snap back to the character's start.
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let offset = offset.min(text.len());
    let mut line = 0u32;
    let mut line_start = 0usize;
    for (idx, byte) in text.as_bytes().iter().enumerate() {
        if idx >= offset {
            break;
        }
        if *byte == b'\n' {
            line += 1;
            line_start = idx + 1;
        }
    }
    let mut boundary = offset;
    while boundary > line_start && !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    let character = text[line_start..boundary].encode_utf16().count() as u32;
    Position::new(line, character)
}

/// Converts an editor position into a byte offset. Lines past the end clamp
/// to the text length; characters past the end of a line clamp to the line
/// end (before its newline).
pub fn position_to_offset(text: &str, pos: Position) -> usize {
    let mut offset = 0usize;
    for (line_idx, line) in text.split_inclusive('\n').enumerate() {
        if line_idx as u32 == pos.line {
            let content_len =
                if line.ends_with('\n') { line.len() - 1 } else { line.len() };
            let mut units = 0u32;
            for (byte_idx, ch) in line[..content_len].char_indices() {
                if units >= pos.character {
                    return offset + byte_idx;
                }
                units += ch.len_utf16() as u32;
            }
            return offset + content_len;
        }
        offset += line.len();
    }
    text.len()
}
