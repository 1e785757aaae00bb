//! File appender implementation
//!
//! Appends one rendered line per entry. With daily rolling enabled the
//! current file is renamed to `<path>.<YYYY-MM-DD>` on the first write of a
//! new day and a fresh file is started.

use crate::core::{Appender, Layout, LogEntry, LoggerError, Result};
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

struct FileState {
    writer: Option<BufWriter<File>>,
    /// Day the current file belongs to
    period: NaiveDate,
}

pub struct FileAppender {
    path: PathBuf,
    layout: Layout,
    daily: bool,
    state: Mutex<FileState>,
}

impl FileAppender {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = Self::open(&path)?;
        let period = Self::file_day(&path).unwrap_or_else(|| Utc::now().date_naive());

        Ok(Self {
            path,
            layout: Layout::default(),
            daily: false,
            state: Mutex::new(FileState {
                writer: Some(BufWriter::new(file)),
                period,
            }),
        })
    }

    /// Roll the file over once per day (UTC)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rust_log_forwarder::appenders::FileAppender;
    ///
    /// let appender = FileAppender::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_daily_rolling();
    /// ```
    #[must_use]
    pub fn with_daily_rolling(mut self) -> Self {
        self.daily = true;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the current file is moved to when `day` is rolled over
    pub fn rolled_path(&self, day: NaiveDate) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", day.format("%Y-%m-%d")));
        PathBuf::from(name)
    }

    fn open(path: &Path) -> Result<File> {
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }

    /// Day of the existing file's last modification, so a restart after
    /// midnight still rolls yesterday's content away
    fn file_day(path: &Path) -> Option<NaiveDate> {
        let modified = fs::metadata(path).ok()?.modified().ok()?;
        let modified: chrono::DateTime<Utc> = modified.into();
        Some(modified.date_naive())
    }

    fn roll_if_due(&self, state: &mut FileState, today: NaiveDate) -> Result<()> {
        if !self.daily || today <= state.period {
            return Ok(());
        }

        if let Some(mut writer) = state.writer.take() {
            writer.flush()?;
        }

        let target = self.rolled_path(state.period);
        fs::rename(&self.path, &target).map_err(|e| {
            LoggerError::writer(format!(
                "failed to roll '{}' to '{}': {}",
                self.path.display(),
                target.display(),
                e
            ))
        })?;

        state.writer = Some(BufWriter::new(Self::open(&self.path)?));
        state.period = today;
        Ok(())
    }

    fn write_entry(&self, entry: &LogEntry, today: NaiveDate) -> Result<()> {
        let mut state = self.state.lock();

        if let Err(e) = self.roll_if_due(&mut state, today) {
            // Keep writing somewhere rather than losing entries
            if state.writer.is_none() {
                state.writer = Some(BufWriter::new(Self::open(&self.path)?));
            }
            state.period = today;
            return Err(e);
        }

        let writer = state
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;

        let mut output = self.layout.format(entry);
        output.push('\n');
        writer.write_all(output.as_bytes())?;
        Ok(())
    }
}

impl Appender for FileAppender {
    fn append(&self, entry: &LogEntry) -> Result<()> {
        self.write_entry(entry, entry.timestamp.date_naive())
    }

    fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(writer) = state.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
