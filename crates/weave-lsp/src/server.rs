//! Request dispatch and the server loop.
//!
//! One thread reads framed messages from the client. Lifecycle and document-sync messages are
//! handled inline; folding, code-action, and apply requests are fanned out to a small fixed pool
//! of workers so a blocking regeneration run cannot stall folding requests for other documents.
//! All outbound traffic funnels through one serialized sink.

use serde_json::{Value, json};
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{self, JoinHandle};

use weave_core::{SpanClassifier, folding_ranges, regen, regenerate_action_at};

use crate::documents::DocumentStore;
use crate::messages::Notifier;
use crate::regen::RegenLauncher;
use crate::settings::{GlobalDefaults, SettingsResolver};
use crate::transport::{self, Incoming};
use crate::uri::file_uri_to_path;

/// Number of concurrent request workers.
pub const MAX_WORKERS: usize = 5;

/// Custom request that runs the regeneration tool on a document.
pub const APPLY_METHOD: &str = "weave/apply";
/// Client-side command name carried by the code action.
pub const APPLY_COMMAND: &str = "weave.apply";
/// User-facing title of the code action.
pub const APPLY_TITLE: &str = "Update generated block";

/// The weave language server.
pub struct Server<C, L> {
    classifier: C,
    launcher: L,
    settings: SettingsResolver,
    documents: DocumentStore,
    notifier: Notifier,
    shutdown_received: AtomicBool,
}

impl<C, L> Server<C, L>
where
    C: SpanClassifier + Send + Sync + 'static,
    L: RegenLauncher + 'static,
{
    /// Create a server. `defaults` are the environment-seeded global defaults; `initialize`
    /// overlays the client's `globalSettings` on top of them.
    pub fn new(classifier: C, launcher: L, defaults: GlobalDefaults, notifier: Notifier) -> Self {
        let level = defaults.notification_level;
        notifier.set_level(level);
        Self {
            classifier,
            launcher,
            settings: SettingsResolver::new(defaults),
            documents: DocumentStore::new(),
            notifier,
            shutdown_received: AtomicBool::new(false),
        }
    }

    /// The settings resolver (exposed for wiring and tests).
    pub fn settings(&self) -> &SettingsResolver {
        &self.settings
    }

    /// Handle one parsed message; `Some` is the response owed for a request.
    pub fn handle(&self, incoming: Incoming) -> Option<Value> {
        match incoming {
            Incoming::Request { id, method, params } => {
                Some(self.handle_request(&id, &method, &params))
            }
            Incoming::Notification { method, params } => {
                self.handle_notification(&method, &params);
                None
            }
        }
    }

    fn handle_request(&self, id: &Value, method: &str, params: &Value) -> Value {
        match method {
            "initialize" => transport::response(id, self.on_initialize(params)),
            "shutdown" => {
                self.shutdown_received.store(true, Ordering::SeqCst);
                transport::response(id, Value::Null)
            }
            "textDocument/foldingRange" => {
                transport::response(id, self.on_folding_range(params))
            }
            "textDocument/codeAction" => transport::response(id, self.on_code_action(params)),
            APPLY_METHOD => self.on_apply(id, params),
            other => {
                log::debug!("unknown request method: {other}");
                transport::error_response(
                    id,
                    transport::METHOD_NOT_FOUND,
                    format!("method not found: {other}"),
                )
            }
        }
    }

    fn handle_notification(&self, method: &str, params: &Value) {
        match method {
            "initialized" => {}
            "textDocument/didOpen" => {
                if let (Some(uri), Some(text)) = (
                    document_uri(params),
                    params
                        .get("textDocument")
                        .and_then(|d| d.get("text"))
                        .and_then(Value::as_str),
                ) {
                    self.documents.open(uri, text.to_string());
                }
            }
            "textDocument/didChange" => {
                // Full sync: the last content change carries the whole document.
                if let (Some(uri), Some(text)) = (
                    document_uri(params),
                    params
                        .get("contentChanges")
                        .and_then(Value::as_array)
                        .and_then(|changes| changes.last())
                        .and_then(|change| change.get("text"))
                        .and_then(Value::as_str),
                ) {
                    self.documents.replace(uri, text.to_string());
                }
            }
            "textDocument/didClose" => {
                if let Some(uri) = document_uri(params) {
                    self.documents.close(uri);
                }
            }
            "workspace/didChangeConfiguration" => self.on_configuration_change(params),
            other => log::debug!("ignoring notification: {other}"),
        }
    }

    fn on_initialize(&self, params: &Value) -> Value {
        if let Ok(cwd) = std::env::current_dir() {
            self.notifier.log(&format!("server cwd: {}", cwd.display()));
        }

        let options = params.get("initializationOptions");

        let defaults = self
            .settings
            .defaults()
            .overlaid(options.and_then(|o| o.get("globalSettings")));
        self.notifier.set_level(defaults.notification_level);
        self.settings.set_defaults(defaults);

        let scope_settings: Vec<Value> = options
            .and_then(|o| o.get("settings"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        self.settings.update_scopes(&scope_settings);
        self.notifier.log(&format!(
            "workspace settings loaded: {}",
            serde_json::to_string(&scope_settings).unwrap_or_else(|_| "<unprintable>".into())
        ));

        json!({
            "capabilities": {
                "textDocumentSync": 1,
                "foldingRangeProvider": true,
                "codeActionProvider": { "codeActionKinds": ["refactor.rewrite"] },
            },
            "serverInfo": {
                "name": "weave-lsp",
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    fn on_configuration_change(&self, params: &Value) {
        // The settings list may arrive bare or nested under the tool's section.
        let list = params
            .get("settings")
            .map(|s| s.get("weave").unwrap_or(s))
            .and_then(Value::as_array)
            .cloned();

        match list {
            Some(settings) => {
                self.settings.update_scopes(&settings);
                self.notifier.log("workspace settings replaced");
            }
            None => self
                .notifier
                .warning("configuration change without a settings list, ignoring"),
        }
    }

    fn on_folding_range(&self, params: &Value) -> Value {
        let Some(text) = document_uri(params).and_then(|uri| self.documents.text(uri)) else {
            return json!([]);
        };

        let folds: Vec<Value> = folding_ranges(&self.classifier, &text)
            .into_iter()
            .map(|fold| {
                json!({
                    "startLine": fold.start_line,
                    "endLine": fold.end_line,
                    "kind": fold.kind.as_str(),
                })
            })
            .collect();
        Value::Array(folds)
    }

    fn on_code_action(&self, params: &Value) -> Value {
        let Some(text) = document_uri(params).and_then(|uri| self.documents.text(uri)) else {
            return json!([]);
        };
        let Some(cursor_line) = params
            .get("range")
            .and_then(|r| r.get("start"))
            .and_then(|s| s.get("line"))
            .and_then(Value::as_u64)
        else {
            return json!([]);
        };

        match regenerate_action_at(&self.classifier, &text, cursor_line as u32) {
            Some(action) => json!([{
                "title": APPLY_TITLE,
                "kind": "refactor.rewrite",
                "command": {
                    "title": APPLY_TITLE,
                    "command": APPLY_COMMAND,
                    "arguments": [action.cursor_line],
                },
            }]),
            None => json!([]),
        }
    }

    fn on_apply(&self, id: &Value, params: &Value) -> Value {
        self.notifier
            .info(&format!("applying regeneration: {params}"));

        let path = params
            .get("documentUri")
            .and_then(Value::as_str)
            .and_then(file_uri_to_path);
        let block_at_line = params
            .get("blockAtLine")
            .and_then(Value::as_u64)
            .map(|line| line as u32);

        let scope = self.settings.resolve_for_path(path.as_deref());
        let regenerator = self.launcher.for_scope(&scope);

        match regen::apply(regenerator.as_ref(), path.as_deref(), block_at_line) {
            Ok(()) => transport::response(id, json!({})),
            Err(err) => {
                self.notifier.error(&format!("regeneration failed: {err}"));
                transport::error_response(id, transport::INTERNAL_ERROR, err.to_string())
            }
        }
    }

    /// Read framed messages from `reader` until `exit` (or EOF) and dispatch them.
    ///
    /// Returns the process exit code: 0 when `exit` follows a `shutdown` request, 1 otherwise.
    pub fn run<R: BufRead>(self: Arc<Self>, reader: &mut R) -> io::Result<i32> {
        let pool = WorkerPool::new(MAX_WORKERS);

        while let Some(message) = transport::read_message(reader)? {
            let Some(incoming) = Incoming::from_value(&message) else {
                log::debug!("ignoring non-request message");
                continue;
            };

            if incoming.method() == "exit" {
                break;
            }

            if is_pooled_method(incoming.method()) {
                let server = Arc::clone(&self);
                pool.execute(move || {
                    if let Some(response) = server.handle(incoming) {
                        server.notifier.sink().send(&response);
                    }
                });
            } else if let Some(response) = self.handle(incoming) {
                self.notifier.sink().send(&response);
            }
        }

        // `exit` and EOF both tear the transport down unconditionally.
        drop(pool);
        let clean = self.shutdown_received.load(Ordering::SeqCst);
        if !clean {
            self.notifier.warning("exit before shutdown");
        }
        Ok(if clean { 0 } else { 1 })
    }
}

fn document_uri(params: &Value) -> Option<&str> {
    params
        .get("textDocument")
        .and_then(|d| d.get("uri"))
        .or_else(|| params.get("documentUri"))
        .and_then(Value::as_str)
}

/// Document-scoped requests run on the pool; a slow regeneration must not block folding
/// elsewhere.
fn is_pooled_method(method: &str) -> bool {
    matches!(
        method,
        "textDocument/foldingRange" | "textDocument/codeAction" | APPLY_METHOD
    )
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size worker pool over a shared channel.
struct WorkerPool {
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    fn new(size: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                thread::spawn(move || loop {
                    let job = {
                        let guard = receiver
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner());
                        guard.recv()
                    };
                    match job {
                        Ok(job) => job(),
                        Err(_) => break,
                    }
                })
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
        }
    }

    fn execute(&self, job: impl FnOnce() + Send + 'static) {
        if let Some(sender) = &self.sender
            && sender.send(Box::new(job)).is_err()
        {
            log::error!("worker pool is gone, dropping request");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
