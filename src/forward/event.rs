//! Events shipped to the collector

use crate::core::LogEntry;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

pub const HEADER_LOGGER_NAME: &str = "logger.name";
pub const HEADER_TIMESTAMP: &str = "timestamp";
pub const HEADER_LOG_LEVEL: &str = "log.level";
pub const HEADER_MESSAGE_ENCODING: &str = "message.encoding";

/// Body encoding advertised in [`HEADER_MESSAGE_ENCODING`]
pub const MESSAGE_ENCODING: &str = "UTF8";

/// A rendered log record plus routing headers
///
/// Built once per append and owned by the send job that delivers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportEvent {
    headers: BTreeMap<String, String>,
    #[serde(serialize_with = "serialize_body")]
    body: Vec<u8>,
}

impl TransportEvent {
    pub fn new(headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Build the event for `entry`, with `rendered` as the body
    pub fn from_entry(entry: &LogEntry, rendered: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(HEADER_LOGGER_NAME.to_string(), entry.logger.clone());
        headers.insert(HEADER_TIMESTAMP.to_string(), entry.epoch_millis().to_string());
        headers.insert(
            HEADER_LOG_LEVEL.to_string(),
            entry.level.severity().to_string(),
        );
        headers.insert(
            HEADER_MESSAGE_ENCODING.to_string(),
            MESSAGE_ENCODING.to_string(),
        );

        Self::new(headers, rendered.as_bytes().to_vec())
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// One JSON line, as written by the TCP transport
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

fn serialize_body<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(body))
}
