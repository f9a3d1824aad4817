//! Structured diagnostics emitted by the lifecycle engine.
//!
//! The engine never prints. It emits severity-tagged events through an
//! injected sink and leaves rendering to the front end. `Fatal` events
//! always accompany a returned error; `Issue` marks a failure the engine
//! deliberately swallows (a child process that would not start or exited
//! nonzero).

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Issue,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Issue => "issue",
            Self::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub severity: Severity,
    pub message: String,
}

/// Sink accepting severity-tagged messages from the engine.
pub trait Diagnostics {
    fn emit(&self, event: DiagnosticEvent);

    fn info(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(DiagnosticEvent {
            severity: Severity::Info,
            message: message.into(),
        });
    }

    fn warning(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(DiagnosticEvent {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    fn issue(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(DiagnosticEvent {
            severity: Severity::Issue,
            message: message.into(),
        });
    }

    fn fatal(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(DiagnosticEvent {
            severity: Severity::Fatal,
            message: message.into(),
        });
    }
}

/// Default sink forwarding events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl Diagnostics for TracingSink {
    fn emit(&self, event: DiagnosticEvent) {
        match event.severity {
            Severity::Info => tracing::info!("{}", event.message),
            Severity::Warning => tracing::warn!("{}", event.message),
            Severity::Issue => tracing::warn!(kind = "issue", "{}", event.message),
            Severity::Fatal => tracing::error!("{}", event.message),
        }
    }
}

/// Sink capturing events in memory; used by tests and embedders that render
/// diagnostics themselves.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn messages_with(&self, severity: Severity) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.severity == severity)
            .map(|event| event.message)
            .collect()
    }
}

impl Diagnostics for RecordingSink {
    fn emit(&self, event: DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl<T: Diagnostics> Diagnostics for &T {
    fn emit(&self, event: DiagnosticEvent) {
        (*self).emit(event);
    }
}
