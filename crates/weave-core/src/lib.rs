#![warn(missing_docs)]
//! `weave-core` - document segmentation engine for weave.
//!
//! Weave documents mix hand-written code with tool-generated regions. This crate contains the
//! pieces with actual invariants: the span model and classifier contract, the byte-offset to
//! line-range mapper, the folding and code-action targeting built on top of it, and the
//! regeneration-invoker contract. Protocol transport and the generation step itself live
//! elsewhere; everything here is synchronous, allocation-light, and recomputed per request.

pub mod actions;
pub mod folding;
pub mod line_map;
pub mod regen;
pub mod span;

pub use actions::{RegenerateAction, regenerate_action_at};
pub use folding::{FoldKind, FoldingRange, folding_ranges};
pub use line_map::{LineRange, byte_range_for_lines, generated_line_ranges};
pub use regen::{RegenerateError, RegenerateRequest, Regenerator, apply};
pub use span::{ClassifyError, Span, SpanClassifier, SpanKind};
