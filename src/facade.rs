//! Named logging handles
//!
//! A `LogHandle` binds a logger name to a shared [`Logger`], so components
//! can log without repeating their name on every call.

use crate::core::{LogLevel, Logger, Result};
use std::sync::Arc;

#[derive(Clone)]
pub struct LogHandle {
    name: String,
    root: Arc<Logger>,
}

impl LogHandle {
    pub fn new(name: impl Into<String>, root: Arc<Logger>) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Handle named after a type's path, e.g. `my_app::server::Listener`
    ///
    /// ```
    /// use rust_log_forwarder::{LogHandle, Logger};
    /// use std::sync::Arc;
    ///
    /// struct Listener;
    ///
    /// let handle = LogHandle::for_type::<Listener>(Arc::new(Logger::new()));
    /// assert!(handle.name().ends_with("::Listener"));
    /// ```
    pub fn for_type<T: ?Sized>(root: Arc<Logger>) -> Self {
        Self::new(std::any::type_name::<T>(), root)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.root.is_enabled(&self.name, level)
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.root.log_to(&self.name, level, message);
    }

    /// Like [`log`](Self::log) but returns the first appender failure
    pub fn try_log(&self, level: LogLevel, message: impl AsRef<str>) -> Result<()> {
        self.root.try_log_to(&self.name, level, message)
    }

    pub fn trace(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Fatal, message);
    }
}
