//! Core logger types and traits

pub mod appender;
pub mod error;
pub mod layout;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod status;

pub use appender::Appender;
pub use error::{LoggerError, Result};
pub use layout::{Layout, LayoutKind, TimestampFormat};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder, ROOT_LOGGER};
pub use metrics::{DeliveryMetrics, LoggerMetrics};
