//! Folding provider: every generated region is a collapsible editor range.

use crate::line_map::{LineRange, generated_line_ranges};
use crate::span::SpanClassifier;

/// Fold kind reported to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldKind {
    /// A marker-delimited region (LSP `FoldingRangeKind.Region`).
    Region,
}

impl FoldKind {
    /// Wire string used by the protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            FoldKind::Region => "region",
        }
    }
}

/// A collapsible range of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldingRange {
    /// First line of the fold.
    pub start_line: u32,
    /// Last line of the fold.
    pub end_line: u32,
    /// Fold kind.
    pub kind: FoldKind,
}

/// Compute folding ranges for `text`: one region fold per generated span.
///
/// Pure read of the current text; no caching. A classification failure is scoped to this request:
/// it is logged and the document simply folds nothing.
pub fn folding_ranges<C: SpanClassifier + ?Sized>(classifier: &C, text: &str) -> Vec<FoldingRange> {
    let spans = match classifier.classify(text, None) {
        Ok(spans) => spans,
        Err(err) => {
            log::error!("classification failed, no folding ranges: {err}");
            return Vec::new();
        }
    };

    generated_line_ranges(text, &spans)
        .into_iter()
        .map(|LineRange { start_line, end_line }| FoldingRange {
            start_line,
            end_line,
            kind: FoldKind::Region,
        })
        .collect()
}
