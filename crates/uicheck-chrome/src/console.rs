//! Console and uncaught-exception capture.
//!
//! Messages accumulate in arrival order for the lifetime of a page. The
//! runner only asks for errors, which include uncaught exceptions, but the
//! full log is kept for debugging.

use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EventConsoleApiCalled, EventExceptionThrown,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Severity of a captured message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warning,
    Error,
    Debug,
    /// An exception nobody caught.
    Exception,
    Other,
}

impl ConsoleLevel {
    /// Errors and uncaught exceptions.
    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Exception)
    }
}

impl From<&ConsoleApiCalledType> for ConsoleLevel {
    fn from(kind: &ConsoleApiCalledType) -> Self {
        match kind {
            ConsoleApiCalledType::Log => Self::Log,
            ConsoleApiCalledType::Info => Self::Info,
            ConsoleApiCalledType::Warning => Self::Warning,
            ConsoleApiCalledType::Error | ConsoleApiCalledType::Assert => Self::Error,
            ConsoleApiCalledType::Debug => Self::Debug,
            _ => Self::Other,
        }
    }
}

/// A captured message with its source location when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
    /// `url:line:column` of the first stack frame.
    pub source: Option<String>,
}

impl ConsoleMessage {
    #[must_use]
    pub fn new(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: String) -> Self {
        self.source = Some(source);
        self
    }
}

/// Shared message buffer, cheap to clone into the CDP listener task.
#[derive(Debug, Clone, Default)]
pub struct ConsoleCapture {
    messages: Arc<Mutex<Vec<ConsoleMessage>>>,
}

impl ConsoleCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, message: ConsoleMessage) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    /// Snapshot of every message so far.
    #[must_use]
    pub fn messages(&self) -> Vec<ConsoleMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Error-level messages and uncaught exceptions, in arrival order.
    #[must_use]
    pub fn errors(&self) -> Vec<ConsoleMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|m| m.level.is_error())
            .cloned()
            .collect()
    }
}

/// Converts a `Runtime.consoleAPICalled` event. Arguments are joined with
/// spaces; non-primitive arguments use their description.
pub(crate) fn parse_console_event(event: &EventConsoleApiCalled) -> ConsoleMessage {
    let text = event
        .args
        .iter()
        .map(|arg| match &arg.value {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => arg
                .description
                .clone()
                .unwrap_or_else(|| "<object>".to_string()),
        })
        .collect::<Vec<_>>()
        .join(" ");

    let message = ConsoleMessage::new(ConsoleLevel::from(&event.r#type), text);
    match event
        .stack_trace
        .as_ref()
        .and_then(|trace| trace.call_frames.first())
    {
        Some(frame) => message.with_source(format!(
            "{}:{}:{}",
            frame.url, frame.line_number, frame.column_number
        )),
        None => message,
    }
}

/// Converts a `Runtime.exceptionThrown` event.
pub(crate) fn parse_exception_event(event: &EventExceptionThrown) -> ConsoleMessage {
    let details = &event.exception_details;
    let text = details
        .exception
        .as_ref()
        .and_then(|exception| exception.description.clone())
        .unwrap_or_else(|| details.text.clone());

    let message = ConsoleMessage::new(ConsoleLevel::Exception, text);
    match &details.url {
        Some(url) => message.with_source(format!(
            "{url}:{}:{}",
            details.line_number, details.column_number
        )),
        None => message,
    }
}
