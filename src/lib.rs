//! # Rust Log Forwarder
//!
//! A logging framework whose main sink ships entries to remote collector
//! endpoints over an RPC client.
//!
//! ## Features
//!
//! - **Forwarding**: one `host:port` or a load-balanced list, fire-and-forget
//!   sends, transparent reconnect when the connection goes inactive
//! - **Multiple Appenders**: console, file with daily rolling, forwarding
//! - **Pluggable Transport**: TCP by default, any [`forward::Connector`] otherwise
//! - **Thread Safe**: every appender takes `&self`
//!
//! ## Quick start
//!
//! ```no_run
//! use rust_log_forwarder::prelude::*;
//!
//! let logger = Logger::builder()
//!     .min_level(LogLevel::Debug)
//!     .appender(ConsoleAppender::new())
//!     .appender(ForwardingAppender::new("10.0.0.1:4141")?)
//!     .build();
//!
//! logger.info("service started");
//! logger.shutdown()?;
//! # Ok::<(), LoggerError>(())
//! ```

pub mod appenders;
pub mod bootstrap;
pub mod core;
pub mod facade;
pub mod forward;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::ConsoleAppender;
    #[cfg(feature = "file")]
    pub use crate::appenders::FileAppender;
    pub use crate::bootstrap::LoggingConfig;
    pub use crate::core::{
        Appender, Layout, LayoutKind, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerError,
        Result, TimestampFormat,
    };
    pub use crate::facade::LogHandle;
    pub use crate::forward::{ForwardingAppender, ForwardingAppenderBuilder};
}

pub use appenders::ConsoleAppender;
#[cfg(feature = "file")]
pub use appenders::FileAppender;
pub use bootstrap::LoggingConfig;
pub use core::{
    Appender, DeliveryMetrics, Layout, LayoutKind, LogEntry, LogLevel, Logger, LoggerBuilder,
    LoggerError, LoggerMetrics, Result, TimestampFormat, ROOT_LOGGER,
};
pub use facade::LogHandle;
pub use forward::{build_config, ConnectionConfig, ForwardingAppender};
