//! JSONL rendering of tracing events.
//!
//! Each event becomes one line: timestamp, level, service, pid, target,
//! message, structured fields, enclosing span path and source location.
//! Fields that carry credentials are replaced with a placeholder before
//! anything is written.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Field names whose values never reach the log.
pub const REDACTED_FIELDS: &[&str] = &["token", "access_token", "refresh_token", "password"];

const REDACTED: &str = "<redacted>";

/// A single structured log line.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub service: String,
    pub pid: u32,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
    /// Enclosing spans, outermost first, joined with `:`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

#[derive(Default)]
struct EntryFields {
    message: Option<String>,
    fields: BTreeMap<String, Value>,
}

impl EntryFields {
    fn put(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else if REDACTED_FIELDS.contains(&name) {
            self.fields.insert(name.to_string(), Value::from(REDACTED));
        } else {
            self.fields.insert(name.to_string(), value);
        }
    }
}

impl Visit for EntryFields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities are not JSON numbers
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.put(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::String(value.to_string()));
    }
}

/// Layer that writes every event as a [`LogEntry`] line.
pub struct JsonLayer<W> {
    service_name: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service_name: impl Into<String>, make_writer: W) -> Self {
        Self {
            service_name: service_name.into(),
            pid: std::process::id(),
            make_writer,
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut recorded = EntryFields::default();
        event.record(&mut recorded);

        let span = ctx.event_scope(event).map(|scope| {
            scope
                .from_root()
                .map(|span| span.name())
                .collect::<Vec<_>>()
                .join(":")
        });
        let metadata = event.metadata();

        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            level: metadata.level().to_string(),
            service: self.service_name.clone(),
            pid: self.pid,
            target: metadata.target().to_string(),
            message: recorded.message.unwrap_or_default(),
            fields: recorded.fields,
            span,
            file: metadata.file().map(str::to_string),
            line: metadata.line(),
        };

        // Logging must never take the process down
        if let Ok(line) = serde_json::to_string(&entry) {
            let _ = writeln!(self.make_writer.make_writer(), "{line}");
        }
    }
}
