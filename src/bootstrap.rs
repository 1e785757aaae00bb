//! Declarative logging setup
//!
//! `LoggingConfig` describes the whole pipeline (levels, layout, sinks) and
//! builds a [`Logger`] from it. Where the description comes from is up to
//! the application; anything `serde` can read works.
//!
//! ```no_run
//! use rust_log_forwarder::bootstrap::LoggingConfig;
//!
//! let config: LoggingConfig = serde_json::from_str(r#"{
//!     "level": "INFO",
//!     "target_levels": { "net::rpc": "ERROR" },
//!     "layout": { "kind": "json" },
//!     "forward": { "hosts": "10.0.0.1:4141 10.0.0.2:4141", "timeout_ms": 5000 }
//! }"#).unwrap();
//!
//! let logger = config.init().unwrap();
//! logger.info("configured");
//! ```

use crate::appenders::ConsoleAppender;
#[cfg(feature = "file")]
use crate::appenders::FileAppender;
use crate::core::{Layout, LogLevel, Logger, Result};
use crate::forward::{ForwardingAppender, HostSelector, DEFAULT_REQUEST_TIMEOUT};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Root threshold
    pub level: LogLevel,
    pub target_levels: BTreeMap<String, LogLevel>,
    /// Shared by every sink built here
    pub layout: Layout,
    pub console: bool,
    pub file: Option<FileSink>,
    pub forward: Option<ForwardSink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileSink {
    pub path: PathBuf,
    #[serde(default)]
    pub daily: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForwardSink {
    /// Whitespace-separated `host:port` list
    pub hosts: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub selector: HostSelector,
    /// Enables endpoint backoff capped at this many milliseconds
    #[serde(default)]
    pub max_backoff_ms: Option<u64>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Debug,
            target_levels: BTreeMap::new(),
            layout: Layout::default(),
            console: true,
            file: None,
            forward: None,
        }
    }
}

impl LoggingConfig {
    /// Build the logger and every configured sink
    ///
    /// Fails if the layout is invalid or a sink cannot be created, for
    /// instance when the forwarding hosts are blank or unreachable.
    pub fn init(&self) -> Result<Logger> {
        self.layout.validate()?;

        let logger = Logger::new();
        logger.set_min_level(self.level);
        for (target, level) in &self.target_levels {
            logger.set_target_level(target.clone(), *level);
        }

        if self.console {
            let console = ConsoleAppender::new().with_layout(self.layout.clone());
            logger.add_appender(Arc::new(console));
        }

        #[cfg(feature = "file")]
        if let Some(ref sink) = self.file {
            let mut file = FileAppender::new(sink.path.clone())?.with_layout(self.layout.clone());
            if sink.daily {
                file = file.with_daily_rolling();
            }
            logger.add_appender(Arc::new(file));
        }

        if let Some(ref sink) = self.forward {
            let mut builder = ForwardingAppender::builder(sink.hosts.clone())
                .timeout(Duration::from_millis(sink.timeout_ms))
                .layout(self.layout.clone())
                .host_selector(sink.selector);
            if let Some(max_backoff_ms) = sink.max_backoff_ms {
                builder = builder.backoff(Duration::from_millis(max_backoff_ms));
            }
            let forwarder = builder.build()?;
            logger.add_appender(Arc::new(forwarder));
        }

        Ok(logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LayoutKind, LoggerError};

    #[test]
    fn test_defaults() {
        let config: LoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.console);
    }

    #[test]
    fn test_deserialize_full() {
        let config: LoggingConfig = serde_json::from_str(
            r#"{
                "level": "WARN",
                "target_levels": { "net::rpc": "ERROR" },
                "layout": { "kind": "logfmt" },
                "console": false,
                "file": { "path": "/tmp/app.log", "daily": true },
                "forward": { "hosts": "a:1 b:2" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.target_levels["net::rpc"], LogLevel::Error);
        assert_eq!(config.layout.kind, LayoutKind::Logfmt);
        assert!(!config.console);
        assert!(config.file.as_ref().unwrap().daily);

        let forward = config.forward.unwrap();
        assert_eq!(forward.hosts, "a:1 b:2");
        assert_eq!(forward.timeout_ms, 20_000);
        assert_eq!(forward.selector, HostSelector::RoundRobin);
        assert_eq!(forward.max_backoff_ms, None);
    }

    #[test]
    fn test_deserialize_forward_selection() {
        let sink: ForwardSink = serde_json::from_str(
            r#"{ "hosts": "a:1 b:2", "selector": "random", "max_backoff_ms": 5000 }"#,
        )
        .unwrap();

        assert_eq!(sink.selector, HostSelector::Random);
        assert_eq!(sink.max_backoff_ms, Some(5000));
    }

    #[cfg(feature = "file")]
    #[test]
    fn test_init_applies_levels_and_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let config = LoggingConfig {
            level: LogLevel::Info,
            target_levels: BTreeMap::from([("noisy".to_string(), LogLevel::Error)]),
            console: false,
            file: Some(FileSink {
                path: path.clone(),
                daily: false,
            }),
            ..LoggingConfig::default()
        };

        let logger = config.init().unwrap();
        assert_eq!(logger.appender_count(), 1);
        assert_eq!(logger.effective_level("noisy::inner"), LogLevel::Error);

        logger.log_to("noisy::inner", LogLevel::Warn, "dropped");
        logger.log_to("app", LogLevel::Info, "kept");
        logger.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("kept"));
        assert!(!content.contains("dropped"));
    }

    #[test]
    fn test_init_rejects_invalid_timestamp_format() {
        let config: LoggingConfig = serde_json::from_str(
            r#"{ "console": false, "layout": { "timestamp": { "Custom": "%Y-%" } } }"#,
        )
        .unwrap();

        let err = match config.init() {
            Ok(_) => panic!("expected init to fail"),
            Err(e) => e,
        };
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_init_rejects_blank_forward_hosts() {
        let config = LoggingConfig {
            console: false,
            forward: Some(ForwardSink {
                hosts: "  ".to_string(),
                timeout_ms: 100,
                selector: HostSelector::default(),
                max_backoff_ms: None,
            }),
            ..LoggingConfig::default()
        };

        let err = match config.init() {
            Ok(_) => panic!("expected init to fail"),
            Err(e) => e,
        };
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
