//! Action targeting: which generated region, if any, sits under the cursor.

use crate::line_map::{LineRange, generated_line_ranges};
use crate::span::SpanClassifier;

/// A regeneration offer for the generated region containing the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenerateAction {
    /// The cursor line the action was requested at (0-based); forwarded verbatim as the
    /// command argument.
    pub cursor_line: u32,
    /// The generated region the cursor falls in.
    pub region: LineRange,
}

/// Return the regeneration action at `cursor_line`, if the line is inside a generated region.
///
/// Ranges are non-overlapping by construction, so at most one can match and the scan stops at
/// the first hit. Classification failures are logged and yield no action.
pub fn regenerate_action_at<C: SpanClassifier + ?Sized>(
    classifier: &C,
    text: &str,
    cursor_line: u32,
) -> Option<RegenerateAction> {
    let spans = match classifier.classify(text, None) {
        Ok(spans) => spans,
        Err(err) => {
            log::error!("classification failed, no code actions: {err}");
            return None;
        }
    };

    generated_line_ranges(text, &spans)
        .into_iter()
        .find(|range| range.start_line <= cursor_line && cursor_line <= range.end_line)
        .map(|region| RegenerateAction {
            cursor_line,
            region,
        })
}
