//! Formatting macros
//!
//! Each macro formats its arguments like `format!` and hands the result to
//! anything with a `log(level, message)` method: a [`Logger`](crate::Logger)
//! or a [`LogHandle`](crate::LogHandle).
//!
//! ```
//! use rust_log_forwarder::prelude::*;
//! use rust_log_forwarder::{info, warn};
//!
//! let logger = Logger::new();
//! info!(logger, "listening on port {}", 4141);
//!
//! let handle = LogHandle::new("net::rpc", std::sync::Arc::new(logger));
//! warn!(handle, "collector {} unreachable", "10.0.0.2:4141");
//! ```

/// Log a formatted message at an explicit level
///
/// The `target:` form logs under another logger name and only works on a
/// [`Logger`](crate::Logger).
///
/// ```
/// # use rust_log_forwarder::prelude::*;
/// use rust_log_forwarder::log;
/// let logger = Logger::new();
/// log!(logger, LogLevel::Error, "status {}", 503);
/// log!(logger, target: "net::rpc", LogLevel::Warn, "slow send");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, target: $target:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_to($target, $level, format!($($arg)+))
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
