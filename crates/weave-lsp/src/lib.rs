#![warn(missing_docs)]
//! `weave-lsp` - editor integration for weave.
//!
//! A stdio JSON-RPC language server exposing the segmentation engine from `weave-core` to
//! editors: folding ranges and code actions over classified documents, a custom `weave/apply`
//! request that runs the regeneration tool, and per-workspace settings resolution. The server is
//! runtime-agnostic (std threads, no async runtime) and recomputes classification per request.

pub mod classifier;
pub mod documents;
pub mod messages;
pub mod regen;
pub mod server;
pub mod settings;
pub mod transport;
pub mod uri;

pub use classifier::MarkerClassifier;
pub use documents::DocumentStore;
pub use messages::{MessageType, Notifier, OutboundSink};
pub use regen::{RegenLauncher, ToolCommand, ToolLauncher};
pub use server::{MAX_WORKERS, Server};
pub use settings::{GlobalDefaults, ImportStrategy, NotificationLevel, SettingsResolver, WorkspaceScope};
pub use transport::{Incoming, read_message, write_message};
pub use uri::{file_uri_to_path, path_to_file_uri};
