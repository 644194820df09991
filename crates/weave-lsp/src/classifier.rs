//! Delimiter-line classifier for weave region markers.
//!
//! The real classifier ships with the regeneration tool; the server only needs enough structure
//! to place folding ranges and code actions, so this scanner recognizes the marker lines and
//! nothing else. A region opens on a line whose first non-blank characters are `#<<` (the rest
//! of the line is the guidance prompt) and closes on a line starting with `#>>`. Marker lines
//! stay literal; the generated span is the text strictly between them, which keeps spans
//! alternating and lets a freshly inserted, still-unfilled region show up as an empty generated
//! span.

use weave_core::{ClassifyError, Span, SpanClassifier};

const OPEN_MARKER: &str = "#<<";
const CLOSE_MARKER: &str = "#>>";

/// Line-oriented scanner for `#<<` / `#>>` region markers.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerClassifier;

impl MarkerClassifier {
    /// Create a classifier.
    pub fn new() -> Self {
        Self
    }
}

impl SpanClassifier for MarkerClassifier {
    fn classify(&self, text: &str, _prior: Option<&[Span]>) -> Result<Vec<Span>, ClassifyError> {
        let mut spans: Vec<Span> = Vec::new();
        let mut literal_start = 0;
        // Some(start) while inside a region: byte offset just past the opening marker line.
        let mut region_start: Option<usize> = None;
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            let line_end = offset + line.len();
            let trimmed = line.trim_start();

            match region_start {
                None if trimmed.starts_with(OPEN_MARKER) => {
                    // The marker line itself belongs to the preceding literal.
                    region_start = Some(line_end);
                }
                Some(start) if trimmed.starts_with(CLOSE_MARKER) => {
                    push_literal(&mut spans, literal_start, start);
                    spans.push(Span::generated(start, offset));
                    literal_start = offset;
                    region_start = None;
                }
                _ => {}
            }

            offset = line_end;
        }

        if let Some(start) = region_start {
            return Err(ClassifyError::UnterminatedRegion(start));
        }

        push_literal(&mut spans, literal_start, text.len());
        Ok(spans)
    }
}

fn push_literal(spans: &mut Vec<Span>, start: usize, end: usize) {
    if start < end {
        spans.push(Span::literal(start, end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weave_core::SpanKind;

    fn classify(text: &str) -> Vec<Span> {
        MarkerClassifier::new().classify(text, None).unwrap()
    }

    #[test]
    fn test_plain_text_is_one_literal_span() {
        let text = "fn main() {}\n";
        assert_eq!(classify(text), vec![Span::literal(0, text.len())]);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(classify(""), vec![]);
    }

    #[test]
    fn test_region_between_markers() {
        let text = "before\n#<< add a greeting\nprintln!(\"hi\");\n#>>\nafter\n";
        let spans = classify(text);

        // literal (incl. opening marker line), generated content, literal (from closer on)
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].kind, SpanKind::Literal);
        assert_eq!(spans[1].kind, SpanKind::Generated);
        assert_eq!(spans[2].kind, SpanKind::Literal);
        assert_eq!(&text[spans[1].start..spans[1].end], "println!(\"hi\");\n");

        // spans are contiguous and cover the document
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[2].end, text.len());
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_unfilled_region_is_empty_generated_span() {
        let text = "a\n#<< todo\n#>>\nb\n";
        let spans = classify(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].kind, SpanKind::Generated);
        assert!(spans[1].is_empty());
    }

    #[test]
    fn test_indented_markers_are_recognized() {
        let text = "fn f() {\n    #<< body\n    let x = 1;\n    #>>\n}\n";
        let spans = classify(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(
            &text[spans[1].start..spans[1].end],
            "    let x = 1;\n"
        );
    }

    #[test]
    fn test_unterminated_region_is_an_error() {
        let text = "a\n#<< dangling\ncontent\n";
        let err = MarkerClassifier::new().classify(text, None).unwrap_err();
        assert!(matches!(err, ClassifyError::UnterminatedRegion(_)));
    }

    #[test]
    fn test_deterministic() {
        let text = "x\n#<< p\ny\n#>>\nz\n";
        assert_eq!(classify(text), classify(text));
    }
}
