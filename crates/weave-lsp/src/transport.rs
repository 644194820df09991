//! JSON-RPC stdio framing and message shaping for the server side.
//!
//! The wire format is the standard LSP framing: a `Content-Length` header, a blank line, then
//! that many bytes of UTF-8 JSON. Incoming messages are split into requests (carry an `id`) and
//! notifications (do not); the distinction decides whether a reply is owed.

use serde_json::{Value, json};
use std::io::{self, BufRead, Write};

/// JSON-RPC error code for an unknown method.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC error code for a request that failed inside the handler.
pub const INTERNAL_ERROR: i64 = -32603;

/// Write one framed JSON-RPC message to `writer`.
pub fn write_message<W: Write>(writer: &mut W, message: &Value) -> io::Result<()> {
    let body = serde_json::to_vec(message)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

    write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
    writer.write_all(&body)?;
    writer.flush()
}

/// Read one framed JSON-RPC message from `reader`.
///
/// `Ok(None)` signals clean EOF (the client closed the channel). A frame without a
/// `Content-Length` header is `InvalidData`.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<Value>> {
    let mut content_length: Option<usize> = None;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':')
            && name.trim().eq_ignore_ascii_case("Content-Length")
        {
            content_length = value.trim().parse().ok();
        }
    }

    let length = content_length.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "missing Content-Length header")
    })?;

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;

    serde_json::from_slice(&body)
        .map(Some)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

/// A parsed inbound JSON-RPC message.
#[derive(Debug, Clone)]
pub enum Incoming {
    /// A request; the sender expects exactly one response carrying `id`.
    Request {
        /// Request id (number or string per JSON-RPC; kept opaque).
        id: Value,
        /// Method name.
        method: String,
        /// Params payload (`Null` when absent).
        params: Value,
    },
    /// A notification; no response is sent.
    Notification {
        /// Method name.
        method: String,
        /// Params payload (`Null` when absent).
        params: Value,
    },
}

impl Incoming {
    /// Parse a raw message value. Returns `None` for values that are not request-or-notification
    /// shaped (e.g. a stray response).
    pub fn from_value(message: &Value) -> Option<Self> {
        let method = message.get("method")?.as_str()?.to_string();
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        match message.get("id") {
            Some(id) if !id.is_null() => Some(Incoming::Request {
                id: id.clone(),
                method,
                params,
            }),
            _ => Some(Incoming::Notification { method, params }),
        }
    }

    /// The method name of either variant.
    pub fn method(&self) -> &str {
        match self {
            Incoming::Request { method, .. } | Incoming::Notification { method, .. } => method,
        }
    }
}

/// Build a successful response for `id`.
pub fn response(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

/// Build an error response for `id`.
pub fn error_response(id: &Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() },
    })
}

/// Build a notification message.
pub fn notification(method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "method": method, "params": params })
}
