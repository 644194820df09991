//! Outbound log and notification plumbing.
//!
//! Everything the server tells the user goes through here: `window/logMessage` always,
//! `window/showMessage` only when the configured notification level admits the severity. Both
//! are mirrored to the `log` facade so the same lines land on stderr for local debugging.

use serde_json::{Value, json};
use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex, RwLock};

use crate::settings::NotificationLevel;
use crate::transport::{notification, write_message};

/// LSP `MessageType` numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// An error.
    Error = 1,
    /// A warning.
    Warning = 2,
    /// Informational.
    Info = 3,
    /// Log-only (lowest severity).
    Log = 4,
}

enum SinkWriter {
    Stdout(Stdout),
    Boxed(Box<dyn Write + Send>),
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SinkWriter::Stdout(w) => w.write(buf),
            SinkWriter::Boxed(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SinkWriter::Stdout(w) => w.flush(),
            SinkWriter::Boxed(w) => w.flush(),
        }
    }
}

/// Shared, serialized writer for all outbound protocol messages.
///
/// Responses from worker threads and notifications interleave on one channel; the mutex keeps
/// frames whole.
#[derive(Clone)]
pub struct OutboundSink {
    writer: Arc<Mutex<SinkWriter>>,
}

impl OutboundSink {
    /// Sink writing to the process stdout (the protocol channel).
    pub fn stdout() -> Self {
        Self {
            writer: Arc::new(Mutex::new(SinkWriter::Stdout(io::stdout()))),
        }
    }

    /// Sink writing to an arbitrary writer (tests).
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(SinkWriter::Boxed(writer))),
        }
    }

    /// Write one framed message. Transport failures are logged and swallowed; there is no one
    /// left to report them to.
    pub fn send(&self, message: &Value) {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(err) = write_message(&mut *writer, message) {
            log::error!("failed to write outbound message: {err}");
        }
    }

    /// Emit `window/logMessage`.
    pub fn log_message(&self, typ: MessageType, text: &str) {
        self.send(&notification(
            "window/logMessage",
            json!({ "type": typ as u8, "message": text }),
        ));
    }

    /// Emit `window/showMessage`.
    pub fn show_message(&self, typ: MessageType, text: &str) {
        self.send(&notification(
            "window/showMessage",
            json!({ "type": typ as u8, "message": text }),
        ));
    }
}

/// Severity-gated user messaging on top of an [`OutboundSink`].
#[derive(Clone)]
pub struct Notifier {
    sink: OutboundSink,
    level: Arc<RwLock<NotificationLevel>>,
}

impl Notifier {
    /// Create a notifier with the given initial level.
    pub fn new(sink: OutboundSink, level: NotificationLevel) -> Self {
        Self {
            sink,
            level: Arc::new(RwLock::new(level)),
        }
    }

    /// Replace the effective level (set when global settings arrive at initialize).
    pub fn set_level(&self, level: NotificationLevel) {
        *self
            .level
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = level;
    }

    fn level(&self) -> NotificationLevel {
        *self
            .level
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The sink this notifier writes through.
    pub fn sink(&self) -> &OutboundSink {
        &self.sink
    }

    /// Log-severity output; never user-visible.
    pub fn log(&self, text: &str) {
        log::debug!("{text}");
        self.sink.log_message(MessageType::Log, text);
    }

    /// Error output; notified when the level shows errors.
    pub fn error(&self, text: &str) {
        log::error!("{text}");
        self.sink.log_message(MessageType::Error, text);
        if self.level().shows_errors() {
            self.sink.show_message(MessageType::Error, text);
        }
    }

    /// Warning output; notified when the level shows warnings.
    pub fn warning(&self, text: &str) {
        log::warn!("{text}");
        self.sink.log_message(MessageType::Warning, text);
        if self.level().shows_warnings() {
            self.sink.show_message(MessageType::Warning, text);
        }
    }

    /// Informational output; notified only at `always`.
    pub fn info(&self, text: &str) {
        log::info!("{text}");
        self.sink.log_message(MessageType::Info, text);
        if self.level().shows_info() {
            self.sink.show_message(MessageType::Info, text);
        }
    }
}
