//! End-to-end request handling against an in-memory server: initialize, document sync, folding,
//! code actions, and regeneration apply, asserting exact JSON responses.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use weave_core::{RegenerateError, RegenerateRequest, Regenerator};
use weave_lsp::{
    GlobalDefaults, Incoming, MarkerClassifier, Notifier, NotificationLevel, OutboundSink,
    RegenLauncher, Server, WorkspaceScope, read_message,
};

#[derive(Clone, Default)]
struct RecordingLauncher {
    requests: Arc<Mutex<Vec<RegenerateRequest>>>,
    scope_roots: Arc<Mutex<Vec<PathBuf>>>,
}

struct RecordingRegenerator {
    requests: Arc<Mutex<Vec<RegenerateRequest>>>,
}

impl Regenerator for RecordingRegenerator {
    fn regenerate(&self, request: &RegenerateRequest) -> Result<(), RegenerateError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

impl RegenLauncher for RecordingLauncher {
    fn for_scope(&self, scope: &WorkspaceScope) -> Box<dyn Regenerator + Send + Sync> {
        self.scope_roots
            .lock()
            .unwrap()
            .push(scope.workspace_root.clone());
        Box::new(RecordingRegenerator {
            requests: Arc::clone(&self.requests),
        })
    }
}

fn new_server() -> (Server<MarkerClassifier, RecordingLauncher>, RecordingLauncher) {
    let launcher = RecordingLauncher::default();
    let notifier = Notifier::new(
        OutboundSink::new(Box::new(io::sink())),
        Default::default(),
    );
    let server = Server::new(
        MarkerClassifier::new(),
        launcher.clone(),
        GlobalDefaults::default(),
        notifier,
    );
    (server, launcher)
}

fn request<L: RegenLauncher + 'static>(
    server: &Server<MarkerClassifier, L>,
    message: Value,
) -> Value {
    let incoming = Incoming::from_value(&message).expect("well-formed message");
    server.handle(incoming).expect("requests get a response")
}

fn notify<L: RegenLauncher + 'static>(server: &Server<MarkerClassifier, L>, message: Value) {
    let incoming = Incoming::from_value(&message).expect("well-formed message");
    assert!(server.handle(incoming).is_none());
}

const DOC_URI: &str = "file:///tmp/ws/app.ws";
const DOC_TEXT: &str = "fn main() {\n#<< print a greeting\nprintln!(\"hi\");\n#>>\n}\n";

fn initialize<L: RegenLauncher + 'static>(server: &Server<MarkerClassifier, L>) -> Value {
    request(
        server,
        json!({
            "id": 1,
            "method": "initialize",
            "params": {
                "initializationOptions": {
                    "globalSettings": { "showNotifications": "onError" },
                    "settings": [{
                        "workspace": "file:///tmp/ws",
                        "interpreter": ["weave"],
                    }],
                },
            },
        }),
    )
}

fn open_doc<L: RegenLauncher + 'static>(server: &Server<MarkerClassifier, L>) {
    notify(
        server,
        json!({
            "method": "textDocument/didOpen",
            "params": { "textDocument": { "uri": DOC_URI, "text": DOC_TEXT } },
        }),
    );
}

#[test]
fn test_initialize_advertises_capabilities() {
    let (server, _) = new_server();
    let response = initialize(&server);

    let capabilities = &response["result"]["capabilities"];
    assert_eq!(capabilities["textDocumentSync"], 1);
    assert_eq!(capabilities["foldingRangeProvider"], true);
    assert_eq!(
        capabilities["codeActionProvider"]["codeActionKinds"],
        json!(["refactor.rewrite"])
    );
    assert_eq!(response["result"]["serverInfo"]["name"], "weave-lsp");
}

#[test]
fn test_folding_ranges_cover_generated_region() {
    let (server, _) = new_server();
    initialize(&server);
    open_doc(&server);

    let response = request(
        &server,
        json!({
            "id": 2,
            "method": "textDocument/foldingRange",
            "params": { "textDocument": { "uri": DOC_URI } },
        }),
    );
    assert_eq!(
        response["result"],
        json!([{ "startLine": 2, "endLine": 2, "kind": "region" }])
    );
}

#[test]
fn test_folding_unknown_document_is_empty() {
    let (server, _) = new_server();
    initialize(&server);

    let response = request(
        &server,
        json!({
            "id": 2,
            "method": "textDocument/foldingRange",
            "params": { "textDocument": { "uri": "file:///never/opened.ws" } },
        }),
    );
    assert_eq!(response["result"], json!([]));
}

#[test]
fn test_malformed_document_folds_nothing() {
    let (server, _) = new_server();
    initialize(&server);
    notify(
        &server,
        json!({
            "method": "textDocument/didOpen",
            "params": { "textDocument": {
                "uri": DOC_URI,
                "text": "#<< never closed\ncontent\n",
            } },
        }),
    );

    let response = request(
        &server,
        json!({
            "id": 2,
            "method": "textDocument/foldingRange",
            "params": { "textDocument": { "uri": DOC_URI } },
        }),
    );
    assert_eq!(response["result"], json!([]));
}

#[test]
fn test_code_action_inside_generated_region() {
    let (server, _) = new_server();
    initialize(&server);
    open_doc(&server);

    let response = request(
        &server,
        json!({
            "id": 3,
            "method": "textDocument/codeAction",
            "params": {
                "textDocument": { "uri": DOC_URI },
                "range": {
                    "start": { "line": 2, "character": 0 },
                    "end": { "line": 2, "character": 0 },
                },
            },
        }),
    );

    let actions = response["result"].as_array().unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["title"], "Update generated block");
    assert_eq!(actions[0]["kind"], "refactor.rewrite");
    assert_eq!(actions[0]["command"]["command"], "weave.apply");
    assert_eq!(actions[0]["command"]["arguments"], json!([2]));
}

#[test]
fn test_code_action_in_literal_text_is_empty() {
    let (server, _) = new_server();
    initialize(&server);
    open_doc(&server);

    let response = request(
        &server,
        json!({
            "id": 3,
            "method": "textDocument/codeAction",
            "params": {
                "textDocument": { "uri": DOC_URI },
                "range": {
                    "start": { "line": 0, "character": 0 },
                    "end": { "line": 0, "character": 0 },
                },
            },
        }),
    );
    assert_eq!(response["result"], json!([]));
}

#[test]
fn test_apply_converts_line_and_resolves_scope() {
    let (server, launcher) = new_server();
    initialize(&server);
    open_doc(&server);

    let response = request(
        &server,
        json!({
            "id": 4,
            "method": "weave/apply",
            "params": { "documentUri": DOC_URI, "blockAtLine": 5 },
        }),
    );
    assert_eq!(response["result"], json!({}));

    let requests = launcher.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].block_at_line, Some(6));
    assert!(requests[0].rewrite);
    assert!(!requests[0].print_only);
    assert_eq!(requests[0].path, PathBuf::from("/tmp/ws/app.ws"));

    let roots = launcher.scope_roots.lock().unwrap();
    assert_eq!(roots[0], PathBuf::from("/tmp/ws"));
}

#[test]
fn test_apply_without_target_line() {
    let (server, launcher) = new_server();
    initialize(&server);

    let response = request(
        &server,
        json!({
            "id": 4,
            "method": "weave/apply",
            "params": { "documentUri": DOC_URI, "blockAtLine": null },
        }),
    );
    assert_eq!(response["result"], json!({}));
    assert_eq!(
        launcher.requests.lock().unwrap()[0].block_at_line,
        None
    );
}

#[test]
fn test_apply_without_uri_is_a_no_op() {
    let (server, launcher) = new_server();
    initialize(&server);

    let response = request(
        &server,
        json!({ "id": 4, "method": "weave/apply", "params": { "blockAtLine": 2 } }),
    );
    assert_eq!(response["result"], json!({}));
    assert!(launcher.requests.lock().unwrap().is_empty());
}

#[test]
fn test_apply_failure_returns_protocol_error() {
    struct FailingLauncher;
    struct FailingRegenerator;

    impl Regenerator for FailingRegenerator {
        fn regenerate(&self, _: &RegenerateRequest) -> Result<(), RegenerateError> {
            Err(RegenerateError::Failed {
                code: Some(1),
                stderr: "tool exploded".into(),
            })
        }
    }
    impl RegenLauncher for FailingLauncher {
        fn for_scope(&self, _: &WorkspaceScope) -> Box<dyn Regenerator + Send + Sync> {
            Box::new(FailingRegenerator)
        }
    }

    let notifier = Notifier::new(
        OutboundSink::new(Box::new(io::sink())),
        Default::default(),
    );
    let server = Server::new(
        MarkerClassifier::new(),
        FailingLauncher,
        GlobalDefaults::default(),
        notifier,
    );

    let response = request(
        &server,
        json!({
            "id": 5,
            "method": "weave/apply",
            "params": { "documentUri": DOC_URI, "blockAtLine": 0 },
        }),
    );
    assert_eq!(response["error"]["code"], -32603);
    assert!(
        response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("tool exploded")
    );
}

#[test]
fn test_did_change_replaces_text() {
    let (server, _) = new_server();
    initialize(&server);
    open_doc(&server);

    // Rewrite the document without any generated regions.
    notify(
        &server,
        json!({
            "method": "textDocument/didChange",
            "params": {
                "textDocument": { "uri": DOC_URI },
                "contentChanges": [{ "text": "plain text only\n" }],
            },
        }),
    );

    let response = request(
        &server,
        json!({
            "id": 6,
            "method": "textDocument/foldingRange",
            "params": { "textDocument": { "uri": DOC_URI } },
        }),
    );
    assert_eq!(response["result"], json!([]));
}

#[test]
fn test_unfilled_region_folds_single_line() {
    let (server, launcher) = new_server();
    initialize(&server);
    notify(
        &server,
        json!({
            "method": "textDocument/didOpen",
            "params": { "textDocument": {
                "uri": DOC_URI,
                "text": "a\n#<< todo\n#>>\nb\n",
            } },
        }),
    );

    // A freshly inserted, still-empty region folds as exactly one line.
    let response = request(
        &server,
        json!({
            "id": 2,
            "method": "textDocument/foldingRange",
            "params": { "textDocument": { "uri": DOC_URI } },
        }),
    );
    assert_eq!(
        response["result"],
        json!([{ "startLine": 2, "endLine": 2, "kind": "region" }])
    );

    let response = request(
        &server,
        json!({
            "id": 3,
            "method": "weave/apply",
            "params": { "documentUri": DOC_URI, "blockAtLine": 2 },
        }),
    );
    assert_eq!(response["result"], json!({}));
    assert_eq!(launcher.requests.lock().unwrap()[0].block_at_line, Some(3));
}

#[test]
fn test_config_change_without_list_notifies_at_on_warning() {
    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let captured = CaptureWriter::default();
    let notifier = Notifier::new(
        OutboundSink::new(Box::new(captured.clone())),
        NotificationLevel::OnWarning,
    );
    let defaults = GlobalDefaults {
        notification_level: NotificationLevel::OnWarning,
        ..GlobalDefaults::default()
    };
    let server = Server::new(
        MarkerClassifier::new(),
        RecordingLauncher::default(),
        defaults,
        notifier,
    );

    notify(
        &server,
        json!({ "method": "workspace/didChangeConfiguration", "params": {} }),
    );

    let bytes = captured.0.lock().unwrap().clone();
    let mut reader = BufReader::new(bytes.as_slice());
    let mut shown = Vec::new();
    while let Ok(Some(message)) = read_message(&mut reader) {
        if message["method"] == "window/showMessage" {
            shown.push(message);
        }
    }
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0]["params"]["type"], 2);
}

#[test]
fn test_shutdown_and_unknown_method() {
    let (server, _) = new_server();

    let response = request(&server, json!({ "id": 9, "method": "shutdown" }));
    assert_eq!(response["result"], Value::Null);

    let response = request(&server, json!({ "id": 10, "method": "textDocument/hover" }));
    assert_eq!(response["error"]["code"], -32601);
}
