use crop::Rope;
use lsp_types::{Position, Range};

use crate::core::Span;

/// Immutable view of a document's text
///
/// Positions follow LSP: zero-based lines and UTF-16 columns. Cloning is
/// cheap because the rope shares its chunks.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    rope: Rope,
    version: i32,
}

impl DocumentSnapshot {
    pub fn new(text: &str, version: i32) -> Self {
        Self {
            rope: Rope::from(text),
            version,
        }
    }

    pub(crate) fn from_rope(rope: Rope, version: i32) -> Self {
        Self { rope, version }
    }

    pub(crate) fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn byte_len(&self) -> usize {
        self.rope.byte_len()
    }

    /// Full text of the document
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text covered by an LSP range
    pub fn text_in(&self, range: Range) -> String {
        let start = self.offset_at(range.start);
        let end = self.offset_at(range.end).max(start);
        self.rope.byte_slice(start..end).to_string()
    }

    /// Text covered by a byte span, clamped to the document
    pub fn text_in_span(&self, span: Span) -> String {
        let end = span.end.min(self.byte_len());
        let start = span.start.min(end);
        self.rope.byte_slice(start..end).to_string()
    }

    /// Convert a byte offset to an LSP position
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.byte_len());
        let line = self.rope.line_of_byte(offset);
        let line_start_byte = self.rope.byte_of_line(line);

        let line_start_utf16 = self.rope.utf16_code_unit_of_byte(line_start_byte);
        let target_utf16 = self.rope.utf16_code_unit_of_byte(offset);

        Position {
            line: line as u32,
            character: (target_utf16 - line_start_utf16) as u32,
        }
    }

    /// Convert an LSP position to a byte offset
    ///
    /// Lines past the end map to the end of the document and columns past
    /// the end of a line map to the end of that line.
    pub fn offset_at(&self, position: Position) -> usize {
        let line = position.line as usize;
        let line_count = self.rope.line_len();
        if line > line_count {
            return self.rope.byte_len();
        }

        let line_start_byte = self.rope.byte_of_line(line);
        let line_byte_len = if line < line_count {
            self.rope.line(line).byte_len()
        } else {
            0
        };

        let line_start_utf16 = self.rope.utf16_code_unit_of_byte(line_start_byte);
        let line_end_utf16 = self
            .rope
            .utf16_code_unit_of_byte(line_start_byte + line_byte_len);
        let target_utf16 = (line_start_utf16 + position.character as usize).min(line_end_utf16);

        self.rope.byte_of_utf16_code_unit(target_utf16)
    }

    /// LSP range for a byte span
    pub fn range_of(&self, span: Span) -> Range {
        Range::new(self.position_at(span.start), self.position_at(span.end))
    }

    /// Number of line-feed bytes in the text
    pub fn line_feed_count(&self) -> usize {
        self.rope
            .chunks()
            .map(|chunk| chunk.bytes().filter(|b| *b == b'\n').count())
            .sum()
    }
}
