//! Regeneration invoker contract.
//!
//! Regeneration is the external step that fills (or refills) a generated region by rewriting the
//! file on disk. This module owns the invocation shape only: the editor/tool line-number
//! convention shift and the missing-path no-op. It performs no diffing and no retries; the editor
//! reloads the changed buffer itself.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Parameters for one regeneration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerateRequest {
    /// Absolute path of the file to regenerate.
    pub path: PathBuf,
    /// Rewrite the file in place.
    pub rewrite: bool,
    /// Print the result instead of writing it (unused by the editor flow, kept for the tool's
    /// full invocation surface).
    pub print_only: bool,
    /// 1-based line identifying the single block to regenerate; `None` regenerates all blocks.
    pub block_at_line: Option<u32>,
}

/// Errors surfaced by a regeneration run.
#[derive(Debug, Error)]
pub enum RegenerateError {
    /// The regeneration command could not be launched.
    #[error("failed to launch regeneration command: {0}")]
    Spawn(#[from] io::Error),

    /// The regeneration command ran but reported failure.
    #[error("regeneration failed (exit {code:?}): {stderr}")]
    Failed {
        /// Process exit code, when the process exited normally.
        code: Option<i32>,
        /// Captured standard error output.
        stderr: String,
    },
}

/// Contract for the external regeneration step.
pub trait Regenerator {
    /// Run regeneration synchronously. On success the file named by the request has been
    /// rewritten on disk.
    fn regenerate(&self, request: &RegenerateRequest) -> Result<(), RegenerateError>;
}

/// Apply regeneration to `path`, optionally targeting the block at a 0-based editor line.
///
/// A missing path (an unsaved buffer) is a no-op, not an error. `block_at_line` is shifted from
/// the editor's 0-based convention to the tool's 1-based convention before being passed down.
/// Errors from the regeneration step propagate to the caller unchanged.
pub fn apply<R: Regenerator + ?Sized>(
    regenerator: &R,
    path: Option<&Path>,
    block_at_line: Option<u32>,
) -> Result<(), RegenerateError> {
    let Some(path) = path else {
        log::info!("regeneration requested without a document path, ignoring");
        return Ok(());
    };

    regenerator.regenerate(&RegenerateRequest {
        path: path.to_path_buf(),
        rewrite: true,
        print_only: false,
        block_at_line: block_at_line.map(|line| line + 1),
    })
}
