//! Span model and the classifier contract.
//!
//! A classifier turns raw document text into an ordered sequence of typed byte-offset spans:
//! `Literal` spans are author-written, `Generated` spans are owned by the tool (and may be empty
//! while a region is still unfilled). The classifier itself ships with the tool, not with this
//! crate; everything here consumes its output through the [`SpanClassifier`] trait.

use thiserror::Error;

/// The kind of a classified document span.
///
/// Marked non-exhaustive: classifiers live outside this crate and may grow new kinds. Consumers
/// are expected to warn and skip kinds they do not recognize rather than fail the request.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Author-written text, passed through unchanged.
    Literal,
    /// Tool-owned region; its content is produced by the generation step and may be empty.
    Generated,
}

/// A typed interval over the document's byte-offset space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Span kind.
    pub kind: SpanKind,
    /// Starting byte offset (inclusive).
    pub start: usize,
    /// Ending byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a span. Callers uphold `start <= end`.
    pub fn new(kind: SpanKind, start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { kind, start, end }
    }

    /// A literal span over `start..end`.
    pub fn literal(start: usize, end: usize) -> Self {
        Self::new(SpanKind::Literal, start, end)
    }

    /// A generated span over `start..end`.
    pub fn generated(start: usize, end: usize) -> Self {
        Self::new(SpanKind::Generated, start, end)
    }

    /// Byte length of the span.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` for a zero-length span (e.g. an unfilled generated region).
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Errors produced by a classifier.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// A generated-region marker was opened but never closed.
    #[error("unterminated generated region starting at byte {0}")]
    UnterminatedRegion(usize),

    /// The document structure could not be classified for another reason.
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Contract for the external span classifier.
///
/// Guarantees required of implementations:
/// - deterministic for identical input text;
/// - output spans are in increasing, non-overlapping, contiguous order and their union covers
///   exactly `[0, text.len())`;
/// - adjacent spans never share the same kind;
/// - every tool-owned region yields a `Generated` span even when it currently holds no content.
///
/// `prior` optionally carries a previous classification of (an earlier revision of) the same
/// document, which implementations may reuse; `None` means classify from scratch.
pub trait SpanClassifier {
    /// Classify `text` into an ordered span sequence.
    fn classify(&self, text: &str, prior: Option<&[Span]>) -> Result<Vec<Span>, ClassifyError>;
}

impl<C: SpanClassifier + ?Sized> SpanClassifier for &C {
    fn classify(&self, text: &str, prior: Option<&[Span]>) -> Result<Vec<Span>, ClassifyError> {
        (**self).classify(text, prior)
    }
}
