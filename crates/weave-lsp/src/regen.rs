//! Subprocess-backed regeneration.
//!
//! Regeneration shells out to the weave preprocessor and blocks until it finishes; the tool
//! rewrites the file in place and the editor reloads the buffer. Which executable runs comes
//! from the resolved workspace scope: an explicit interpreter argv wins, otherwise the import
//! strategy picks between the bundled tool directory and the user's `PATH`.

use std::path::PathBuf;
use std::process::Command;

use weave_core::{RegenerateError, RegenerateRequest, Regenerator};

use crate::settings::{ImportStrategy, WorkspaceScope};

/// Name of the regeneration executable.
pub const TOOL_NAME: &str = "weave";

/// Builds a [`ToolCommand`] for the scope a request resolved to.
pub trait RegenLauncher: Send + Sync {
    /// Regenerator configured for `scope`.
    fn for_scope(&self, scope: &WorkspaceScope) -> Box<dyn Regenerator + Send + Sync>;
}

/// Default launcher: knows where the bundled tool lives.
#[derive(Debug, Clone)]
pub struct ToolLauncher {
    /// Directory holding the bundled copy of the tool.
    pub bundled_dir: PathBuf,
}

impl ToolLauncher {
    /// Create a launcher rooted at the bundled tool directory.
    pub fn new(bundled_dir: PathBuf) -> Self {
        Self { bundled_dir }
    }

    fn argv_for_scope(&self, scope: &WorkspaceScope) -> Vec<String> {
        if !scope.interpreter.is_empty() {
            return scope.interpreter.clone();
        }
        match scope.import_strategy {
            ImportStrategy::UseBundled => {
                vec![self.bundled_dir.join(TOOL_NAME).to_string_lossy().into_owned()]
            }
            ImportStrategy::FromEnvironment => vec![TOOL_NAME.to_string()],
        }
    }
}

impl RegenLauncher for ToolLauncher {
    fn for_scope(&self, scope: &WorkspaceScope) -> Box<dyn Regenerator + Send + Sync> {
        Box::new(ToolCommand {
            argv: self.argv_for_scope(scope),
            extra_args: scope.extra_args.clone(),
            cwd: scope.cwd.clone(),
        })
    }
}

/// One configured tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    argv: Vec<String>,
    extra_args: Vec<String>,
    cwd: PathBuf,
}

impl ToolCommand {
    /// Arguments appended after the base argv for `request`.
    fn request_args(&self, request: &RegenerateRequest) -> Vec<String> {
        let mut args = self.extra_args.clone();
        if request.rewrite {
            args.push("--rewrite".to_string());
        }
        if request.print_only {
            args.push("--print".to_string());
        }
        if let Some(line) = request.block_at_line {
            args.push("--block-at-line".to_string());
            args.push(line.to_string());
        }
        args.push(request.path.to_string_lossy().into_owned());
        args
    }
}

impl Regenerator for ToolCommand {
    fn regenerate(&self, request: &RegenerateRequest) -> Result<(), RegenerateError> {
        let Some((program, base_args)) = self.argv.split_first() else {
            return Err(RegenerateError::Failed {
                code: None,
                stderr: "empty regeneration command".to_string(),
            });
        };

        log::info!("regenerating {} via {program}", request.path.display());
        let output = Command::new(program)
            .args(base_args)
            .args(self.request_args(request))
            .current_dir(&self.cwd)
            .output()?;

        if output.status.success() {
            Ok(())
        } else {
            Err(RegenerateError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}
