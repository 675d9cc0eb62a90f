//! Tracing layer that forwards persona session status lines to a channel.
//!
//! Request handlers and admin views subscribe to the receiving end to show
//! "session created / restored / expired / checkpointed" lines without
//! scraping the process log.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Default target prefix of the events forwarded by the layer.
pub const SESSION_LOG_TARGET: &str = "inbox_application";

/// A status line sent to subscribers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionLogLine {
    /// Event target (e.g., "inbox_application::session::manager")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    /// Human-readable message
    pub message: String,
    /// Structured fields from the event (e.g., session_id)
    pub fields: HashMap<String, Value>,
    /// Fields of the enclosing span, if any
    pub span: HashMap<String, Value>,
    pub timestamp: String,
}

/// A tracing layer that sends matching events to a channel.
pub struct SessionLogLayer {
    sender: mpsc::UnboundedSender<SessionLogLine>,
    target_prefix: String,
}

impl SessionLogLayer {
    /// Forwards events from the session manager and interview service.
    pub fn new(sender: mpsc::UnboundedSender<SessionLogLine>) -> Self {
        Self::with_target_prefix(sender, SESSION_LOG_TARGET)
    }

    pub fn with_target_prefix(
        sender: mpsc::UnboundedSender<SessionLogLine>,
        target_prefix: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            target_prefix: target_prefix.into(),
        }
    }

    /// Creates a layer together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionLogLine>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl<S> Layer<S> for SessionLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if !attrs.metadata().target().starts_with(&self.target_prefix) {
            return;
        }
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(fields);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(&self.target_prefix) {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        let mut span_fields = HashMap::new();
        if let Some(span) = ctx.event_span(event) {
            let extensions = span.extensions();
            if let Some(stored) = extensions.get::<HashMap<String, Value>>() {
                span_fields = stored.clone();
            }
        }

        let message = fields
            .remove("message")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        let line = SessionLogLine {
            target: metadata.target().to_string(),
            level: metadata.level().to_string(),
            message,
            fields,
            span: span_fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // Receiver may be gone; logging must never fail the caller.
        let _ = self.sender.send(line);
    }
}

/// Field visitor that extracts tracing fields into a HashMap
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(
            field.name().to_string(),
            serde_json::json!(format!("{:?}", value)),
        );
    }
}
