//! Layouts render a log entry into the text an appender writes or forwards
//!
//! - Text: `2025-01-08 10:30:45 INFO  [main] app::server - Request processed`
//! - Json: one JSON object per entry
//! - Logfmt: `timestamp=... level=INFO logger=app::server message="..."`

use super::error::{LoggerError, Result};
use super::log_entry::LogEntry;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Timestamp rendering used by a [`Layout`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08 10:30:45`
    #[default]
    DateTime,

    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Any strftime-compatible format string
    ///
    /// Rendering falls back to [`TimestampFormat::DateTime`] if the string is
    /// not a valid strftime format; [`TimestampFormat::validate`] rejects it
    /// up front.
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::DateTime => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => {
                let mut out = String::new();
                if write!(out, "{}", datetime.format(format_str)).is_err() {
                    return TimestampFormat::DateTime.format(datetime);
                }
                out
            }
        }
    }

    /// Reject custom format strings chrono cannot render
    pub fn validate(&self) -> Result<()> {
        if let TimestampFormat::Custom(format_str) = self {
            if StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error)) {
                return Err(LoggerError::config(
                    "layout",
                    format!("invalid timestamp format '{}'", format_str),
                ));
            }
        }
        Ok(())
    }

    fn to_json_value(&self, datetime: &DateTime<Utc>) -> serde_json::Value {
        match self {
            TimestampFormat::UnixMillis => {
                serde_json::Value::Number(datetime.timestamp_millis().into())
            }
            _ => serde_json::Value::String(self.format(datetime)),
        }
    }
}

/// Output shape of a [`Layout`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Text,
    Json,
    Logfmt,
}

/// Renders entries for appenders
///
/// # Example
///
/// ```
/// use rust_log_forwarder::{Layout, LogEntry, LogLevel, TimestampFormat};
///
/// let layout = Layout::text().with_timestamp(TimestampFormat::Iso8601);
/// let line = layout.format(&LogEntry::new("app", LogLevel::Info, "ready"));
/// assert!(line.ends_with("app - ready"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub kind: LayoutKind,
    pub timestamp: TimestampFormat,
}

impl Layout {
    pub fn text() -> Self {
        Self::default()
    }

    pub fn json() -> Self {
        Self {
            kind: LayoutKind::Json,
            timestamp: TimestampFormat::Iso8601,
        }
    }

    pub fn logfmt() -> Self {
        Self {
            kind: LayoutKind::Logfmt,
            timestamp: TimestampFormat::Iso8601,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: TimestampFormat) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Render an entry without a trailing newline
    pub fn validate(&self) -> Result<()> {
        self.timestamp.validate()
    }

    pub fn format(&self, entry: &LogEntry) -> String {
        match self.kind {
            LayoutKind::Text => self.format_text(entry),
            LayoutKind::Json => self.format_json(entry),
            LayoutKind::Logfmt => self.format_logfmt(entry),
        }
    }

    fn format_text(&self, entry: &LogEntry) -> String {
        format!(
            "{} {:5} [{}] {} - {}",
            self.timestamp.format(&entry.timestamp),
            entry.level.to_str(),
            entry.thread_label(),
            entry.logger,
            entry.message
        )
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        let mut json_obj = serde_json::Map::new();
        json_obj.insert(
            "timestamp".to_string(),
            self.timestamp.to_json_value(&entry.timestamp),
        );
        json_obj.insert(
            "level".to_string(),
            serde_json::Value::String(entry.level.to_str().to_string()),
        );
        json_obj.insert(
            "logger".to_string(),
            serde_json::Value::String(entry.logger.clone()),
        );
        json_obj.insert(
            "thread".to_string(),
            serde_json::Value::String(entry.thread_label().to_string()),
        );
        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(entry.message.clone()),
        );

        serde_json::Value::Object(json_obj).to_string()
    }

    fn format_logfmt(&self, entry: &LogEntry) -> String {
        [
            format!(
                "timestamp={}",
                escape_logfmt_value(&self.timestamp.format(&entry.timestamp))
            ),
            format!("level={}", entry.level.to_str()),
            format!("logger={}", escape_logfmt_value(&entry.logger)),
            format!("thread={}", escape_logfmt_value(entry.thread_label())),
            // always quoted
            format!("message={}", quote_logfmt_value(&entry.message)),
        ]
        .join(" ")
    }
}

fn escape_logfmt_value(value: &str) -> String {
    if value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
