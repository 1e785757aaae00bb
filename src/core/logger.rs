//! Root dispatcher
//!
//! A `Logger` owns the appenders and the level configuration. There is no
//! process-wide instance: build one at startup, share it by reference or
//! `Arc`, and tear it down with [`Logger::shutdown`].

use super::{
    appender::Appender,
    error::{LoggerError, Result},
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    status,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Logger name used by the level helpers on [`Logger`] itself
pub const ROOT_LOGGER: &str = "root";

pub struct Logger {
    min_level: RwLock<LogLevel>,
    /// Per-logger-name thresholds, keyed by `::`-separated prefix
    target_levels: RwLock<BTreeMap<String, LogLevel>>,
    appenders: RwLock<Vec<Arc<dyn Appender>>>,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_level: RwLock::new(LogLevel::Info),
            target_levels: RwLock::new(BTreeMap::new()),
            appenders: RwLock::new(Vec::new()),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    pub fn add_appender(&self, appender: Arc<dyn Appender>) {
        self.appenders.write().push(appender);
    }

    pub fn appender_count(&self) -> usize {
        self.appenders.read().len()
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    /// Override the threshold for one logger name and everything below it
    ///
    /// `set_target_level("net::rpc", LogLevel::Error)` silences `net::rpc`
    /// and `net::rpc::client` below ERROR, but leaves `net::rpcx` alone.
    pub fn set_target_level(&self, target: impl Into<String>, level: LogLevel) {
        self.target_levels.write().insert(target.into(), level);
    }

    /// Threshold that applies to `target`: the longest matching prefix wins
    pub fn effective_level(&self, target: &str) -> LogLevel {
        let levels = self.target_levels.read();
        levels
            .iter()
            .filter(|(prefix, _)| target_matches(prefix, target))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, level)| *level)
            .unwrap_or_else(|| *self.min_level.read())
    }

    pub fn is_enabled(&self, target: &str, level: LogLevel) -> bool {
        level >= self.effective_level(target)
    }

    /// Dispatch to every appender, reporting appender failures internally
    pub fn log_to(&self, target: &str, level: LogLevel, message: impl AsRef<str>) {
        if !self.is_enabled(target, level) {
            self.metrics.record_filtered();
            return;
        }

        let entry = LogEntry::new(target, level, message);
        let appenders = self.appenders.read();
        if let Err(e) = Self::process_sync(&appenders, &entry, &self.metrics) {
            report_failure("Appender failed", &e);
        }
    }

    /// Dispatch to every appender and return the first appender failure
    ///
    /// All appenders still receive the entry when an earlier one fails.
    pub fn try_log_to(
        &self,
        target: &str,
        level: LogLevel,
        message: impl AsRef<str>,
    ) -> Result<()> {
        if !self.is_enabled(target, level) {
            self.metrics.record_filtered();
            return Ok(());
        }

        let entry = LogEntry::new(target, level, message);
        let appenders = self.appenders.read();
        Self::process_sync(&appenders, &entry, &self.metrics)
    }

    /// Process one entry with per-appender panic isolation
    fn process_sync(
        appenders: &[Arc<dyn Appender>],
        entry: &LogEntry,
        metrics: &LoggerMetrics,
    ) -> Result<()> {
        let mut first_error = None;

        for appender in appenders {
            let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(entry)
            }));

            let err = match append_result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    LoggerError::other(format!(
                        "appender '{}' panicked: {}",
                        appender.name(),
                        panic_msg
                    ))
                }
            };

            if first_error.is_some() {
                report_failure(&format!("Appender '{}' failed", appender.name()), &err);
            } else {
                first_error = Some(err);
            }
        }

        match first_error {
            None => {
                metrics.record_logged();
                Ok(())
            }
            Some(err) => {
                metrics.record_failed();
                Err(err)
            }
        }
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.log_to(ROOT_LOGGER, level, message);
    }

    #[inline]
    pub fn trace(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Fatal, message);
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn flush(&self) -> Result<()> {
        for appender in self.appenders.read().iter() {
            appender.flush()?;
        }
        Ok(())
    }

    /// Detach and close every appender
    ///
    /// Each appender is closed exactly once even if an earlier one fails;
    /// the first failure is returned. Logging after shutdown is a no-op.
    pub fn shutdown(&self) -> Result<()> {
        let appenders = std::mem::take(&mut *self.appenders.write());
        let mut first_error = None;

        for appender in appenders {
            if let Err(e) = appender.close() {
                let context = format!("Failed to close appender '{}'", appender.name());
                status::report_error(&context, &e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Closed or unconfigured appenders are a warning, anything else an error
fn report_failure(context: &str, err: &LoggerError) {
    if err.is_lifecycle() {
        status::report_warning(&format!("{}: {}", context, err));
    } else {
        status::report_error(context, err);
    }
}

fn target_matches(prefix: &str, target: &str) -> bool {
    match target.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        // Appenders still attached were never shut down explicitly
        if let Err(e) = self.flush() {
            status::report_error("Failed to flush during drop", &e);
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_log_forwarder::prelude::*;
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .target_level("net::rpc", LogLevel::Error)
///     .appender(ConsoleAppender::new())
///     .build();
/// assert_eq!(logger.effective_level("net::rpc::client"), LogLevel::Error);
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    target_levels: BTreeMap<String, LogLevel>,
    appenders: Vec<Arc<dyn Appender>>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            target_levels: BTreeMap::new(),
            appenders: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn target_level(mut self, target: impl Into<String>, level: LogLevel) -> Self {
        self.target_levels.insert(target.into(), level);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Arc::new(appender));
        self
    }

    /// Add an appender the caller keeps a handle to
    #[must_use = "builder methods return a new value"]
    pub fn shared_appender(mut self, appender: Arc<dyn Appender>) -> Self {
        self.appenders.push(appender);
        self
    }

    pub fn build(self) -> Logger {
        let logger = Logger::new();
        logger.set_min_level(self.min_level);
        for (target, level) in self.target_levels {
            logger.set_target_level(target, level);
        }
        for appender in self.appenders {
            logger.add_appender(appender);
        }
        logger
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}
