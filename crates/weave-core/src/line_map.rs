//! Position mapper: byte-offset spans to 0-based line ranges and back.
//!
//! Editors address folding ranges and code actions by line number while the classifier works in
//! byte offsets. The mapping walks the span sequence once, counting line breaks consumed per
//! span; it is recomputed per request, so there is nothing to invalidate.

use crate::span::{Span, SpanKind};
use ropey::Rope;

/// An inclusive pair of 0-based line numbers covering one generated region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// First line of the region.
    pub start_line: u32,
    /// Last line of the region; always `>= start_line`.
    pub end_line: u32,
}

/// Map classified spans to one [`LineRange`] per `Generated` span, in document order.
///
/// Emitted ranges are pairwise disjoint and non-decreasing by start line. A generated span with
/// no enclosed newline (including an empty, still-unfilled region) yields a single-line range at
/// the running cursor. Spans whose offsets fall outside `text` (a broken classifier) and spans of
/// unrecognized kind are skipped with a warning, never a panic.
pub fn generated_line_ranges(text: &str, spans: &[Span]) -> Vec<LineRange> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut line_cursor: u32 = 0;

    for span in spans {
        let Some(slice) = bytes.get(span.start..span.end) else {
            log::warn!(
                "span {}..{} out of bounds for {}-byte document, skipping",
                span.start,
                span.end,
                bytes.len()
            );
            continue;
        };
        let newlines = slice.iter().filter(|&&b| b == b'\n').count() as u32;

        match span.kind {
            SpanKind::Generated => {
                let start_line = line_cursor;
                line_cursor += newlines;
                // A span ending mid-line (or holding no newline at all) still covers the line
                // the cursor sits on.
                let end_line = line_cursor.saturating_sub(1).max(start_line);
                ranges.push(LineRange {
                    start_line,
                    end_line,
                });
            }
            kind => {
                if !matches!(kind, SpanKind::Literal) {
                    log::warn!("unrecognized span kind {kind:?}, treating as literal");
                }
                line_cursor += newlines;
            }
        }
    }

    ranges
}

/// Re-derive the byte window covering `range` within `text`.
///
/// The window starts at the first byte of `range.start_line` and ends at the first byte of the
/// line after `range.end_line` (or at end of text). Line numbers past the end of the document
/// are clamped.
pub fn byte_range_for_lines(text: &str, range: &LineRange) -> (usize, usize) {
    let rope = Rope::from_str(text);
    let last_line = rope.len_lines().saturating_sub(1);

    let start_line = (range.start_line as usize).min(last_line);
    let start = rope.line_to_byte(start_line);

    let after_end = range.end_line as usize + 1;
    let end = if after_end > last_line {
        rope.len_bytes()
    } else {
        rope.line_to_byte(after_end)
    };

    (start, end)
}
