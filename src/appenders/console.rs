//! Console appender implementation

use crate::core::{Appender, Layout, LayoutKind, LogEntry, LogLevel, Result};
#[cfg(feature = "console")]
use colored::Colorize;

pub struct ConsoleAppender {
    use_colors: bool,
    layout: Layout,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
            layout: Layout::default(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            layout: Layout::default(),
        }
    }

    /// Set the layout for this appender
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_forwarder::appenders::ConsoleAppender;
    /// use rust_log_forwarder::Layout;
    ///
    /// let appender = ConsoleAppender::new().with_layout(Layout::json());
    /// ```
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    fn render(&self, entry: &LogEntry) -> String {
        let output = self.layout.format(entry);
        if !self.use_colors || self.layout.kind != LayoutKind::Text {
            return output;
        }
        Self::colorize_level(entry, output)
    }

    #[cfg(feature = "console")]
    fn colorize_level(entry: &LogEntry, output: String) -> String {
        let label = entry.level.to_str();
        output.replacen(
            label,
            &label.color(entry.level.color_code()).to_string(),
            1,
        )
    }

    #[cfg(not(feature = "console"))]
    fn colorize_level(_entry: &LogEntry, output: String) -> String {
        output
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&self, entry: &LogEntry) -> Result<()> {
        let output = self.render(entry);

        // Route Error and Fatal levels to stderr, others to stdout
        match entry.level {
            LogLevel::Error | LogLevel::Fatal => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
