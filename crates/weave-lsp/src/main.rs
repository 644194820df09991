//! weave language server binary.
//!
//! Speaks LSP over stdio. Protocol traffic owns stdout; diagnostics for humans go to stderr via
//! `env_logger` (`RUST_LOG=weave_lsp=debug` etc.). Environment knobs, read once at startup:
//!
//! - `WEAVE_IMPORT_STRATEGY`: `useBundled` (default) or `fromEnvironment` — where the
//!   regeneration tool comes from.
//! - `WEAVE_SHOW_NOTIFICATION`: `off` (default), `onError`, `onWarning`, or `always` — which log
//!   severities also pop user-visible notifications.
//! - `WEAVE_BUNDLED_DIR`: directory of the bundled tool; defaults to the server executable's
//!   directory.

use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use weave_lsp::{
    GlobalDefaults, MarkerClassifier, Notifier, OutboundSink, Server, ToolLauncher,
};

fn bundled_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("WEAVE_BUNDLED_DIR") {
        return PathBuf::from(dir);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() -> ExitCode {
    env_logger::init();

    let defaults = GlobalDefaults::from_env();
    let notifier = Notifier::new(OutboundSink::stdout(), defaults.notification_level);
    let server = Arc::new(Server::new(
        MarkerClassifier::new(),
        ToolLauncher::new(bundled_dir()),
        defaults,
        notifier,
    ));

    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    match server.run(&mut reader) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            log::error!("transport failure: {err}");
            ExitCode::from(1)
        }
    }
}
