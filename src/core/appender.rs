//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// A destination for log entries
///
/// Methods take `&self` so the dispatcher can call one appender from many
/// threads at once; implementations guard their own mutable state.
pub trait Appender: Send + Sync {
    fn append(&self, entry: &LogEntry) -> Result<()>;

    fn flush(&self) -> Result<()>;

    fn name(&self) -> &str;

    /// Activation hook: (re)acquire whatever resources the appender writes to
    fn configure(&self) -> Result<()> {
        Ok(())
    }

    /// Shutdown hook: release resources; later appends may fail
    fn close(&self) -> Result<()> {
        self.flush()
    }
}
