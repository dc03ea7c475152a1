//! Rotating file appender
//!
//! Rotation is decided synchronously before each write: by line count, by
//! byte size, and/or when the local date changes. The record that triggers a
//! rotation is written to the fresh file, never dropped. Rotated files are
//! renamed to `<file>.<YYYY-MM-DD>.<NNN>` and pruned by age and by count.

use crate::core::appender::{Appender, Closable, Reloadable};
use crate::core::error::{LoggerError, Result};
use crate::core::output_format::OutputFormat;
use crate::core::record::Record;
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Highest sequence number tried for one day
const MAX_SEQUENCE: u32 = 999;

/// When to rotate and how many rotated files to keep
///
/// # Examples
///
/// ```
/// use rust_log_registry::appenders::RotationPolicy;
///
/// // 64 MiB files, at most 10 kept, no daily rotation
/// let policy = RotationPolicy::new()
///     .with_max_size_shift(26)
///     .with_daily(false)
///     .with_max_files(10);
/// assert_eq!(policy.max_bytes, 64 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPolicy {
    /// Master switch; when false the file grows forever
    pub rotate: bool,
    /// Rotate once this many lines were written (0 disables)
    pub max_lines: u64,
    /// Rotate once the file reaches this size (0 disables)
    pub max_bytes: u64,
    /// Rotate when the local date changes
    pub daily: bool,
    /// Delete rotated files older than this many days (0 keeps them)
    pub max_days: u64,
    /// Keep at most this many rotated files (0 keeps them all)
    pub max_files: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            rotate: true,
            max_lines: 1_000_000,
            max_bytes: 1 << 28,
            daily: true,
            max_days: 7,
            max_files: 0,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_lines(mut self, lines: u64) -> Self {
        self.max_lines = lines;
        self
    }

    /// Size limit given as a power of two, `1 << shift` bytes
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_shift(mut self, shift: u32) -> Self {
        self.max_bytes = 1u64 << shift.min(63);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_daily(mut self, daily: bool) -> Self {
        self.daily = daily;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_days(mut self, days: u64) -> Self {
        self.max_days = days;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }
}

struct FileState {
    writer: Option<BufWriter<File>>,
    current_size: u64,
    current_lines: u64,
    open_date: NaiveDate,
    /// Set by `close`; a closed appender stays closed across reloads
    closed: bool,
}

pub struct RotatingFileAppender {
    base_path: PathBuf,
    policy: RotationPolicy,
    output_format: OutputFormat,
    state: Mutex<FileState>,
}

impl RotatingFileAppender {
    /// Create an appender with the default policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn new<P: AsRef<Path>>(path: P, format: OutputFormat) -> Result<Self> {
        Self::with_policy(path, format, RotationPolicy::default())
    }

    /// Create an appender with a custom policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn with_policy<P: AsRef<Path>>(
        path: P,
        format: OutputFormat,
        policy: RotationPolicy,
    ) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "create log directory",
                        format!("Failed to create directory '{}'", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let state = Self::open_state(&base_path)?;

        Ok(Self {
            base_path,
            policy,
            output_format: format,
            state: Mutex::new(state),
        })
    }

    /// Open `path` for append and pick up its current size and line count
    fn open_state(path: &Path) -> Result<FileState> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let current_size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_appender(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();

        let current_lines = if current_size == 0 {
            0
        } else {
            Self::count_lines(path)?
        };

        Ok(FileState {
            writer: Some(BufWriter::new(file)),
            current_size,
            current_lines,
            open_date: Local::now().date_naive(),
            closed: false,
        })
    }

    fn count_lines(path: &Path) -> Result<u64> {
        let file = File::open(path).map_err(|e| {
            LoggerError::io_operation("count log lines", path.display().to_string(), e)
        })?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);
        let mut lines = 0u64;
        loop {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            lines += buf.iter().filter(|b| **b == b'\n').count() as u64;
            let consumed = buf.len();
            reader.consume(consumed);
        }
        Ok(lines)
    }

    fn should_rotate(&self, state: &FileState) -> bool {
        if !self.policy.rotate {
            return false;
        }
        (self.policy.max_lines > 0 && state.current_lines >= self.policy.max_lines)
            || (self.policy.max_bytes > 0 && state.current_size >= self.policy.max_bytes)
            || (self.policy.daily && Local::now().date_naive() != state.open_date)
    }

    fn file_name(&self) -> String {
        self.base_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log")
            .to_string()
    }

    fn directory(&self) -> PathBuf {
        match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Rotated files belonging to this appender, oldest first
    fn rotated_files(&self) -> Vec<PathBuf> {
        let prefix = format!("{}.", self.file_name());
        let mut files: Vec<PathBuf> = match fs::read_dir(self.directory()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&prefix))
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }

    /// Next unused `<file>.<date>.<NNN>` for today
    fn next_rotated_path(&self) -> Result<PathBuf> {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let stem = format!("{}.{}.", self.file_name(), date);

        let highest = self
            .rotated_files()
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .filter_map(|n| n.strip_prefix(&stem).and_then(|seq| seq.parse::<u32>().ok()))
            .max()
            .unwrap_or(0);

        let next = highest + 1;
        if next > MAX_SEQUENCE {
            return Err(LoggerError::file_rotation(
                self.base_path.display().to_string(),
                format!("Cannot find free log number to rename {}", self.base_path.display()),
            ));
        }

        let mut path = self.base_path.clone();
        path.set_file_name(format!("{}{:03}", stem, next));
        Ok(path)
    }

    fn rotate(&self, state: &mut FileState) -> Result<()> {
        if let Some(mut writer) = state.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let rotated = self.next_rotated_path()?;
        if self.base_path.exists() {
            fs::rename(&self.base_path, &rotated).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;
        }

        *state = Self::open_state(&self.base_path)?;
        self.delete_old_files();
        Ok(())
    }

    /// Prune rotated files by age, then by count. Failures are reported, not returned.
    fn delete_old_files(&self) {
        let mut files = self.rotated_files();

        if self.policy.max_days > 0 {
            let max_age = Duration::from_secs(self.policy.max_days * 24 * 60 * 60);
            let now = SystemTime::now();
            files.retain(|path| {
                let expired = fs::metadata(path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age > max_age);
                if expired {
                    if let Err(e) = fs::remove_file(path) {
                        eprintln!("[WARN] Failed to remove expired log file {}: {}", path.display(), e);
                        return true;
                    }
                    return false;
                }
                true
            });
        }

        if self.policy.max_files > 0 && files.len() > self.policy.max_files {
            let excess = files.len() - self.policy.max_files;
            for path in files.iter().take(excess) {
                if let Err(e) = fs::remove_file(path) {
                    eprintln!("[WARN] Failed to remove old log file {}: {}", path.display(), e);
                }
            }
        }
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.state.lock().current_size
    }

    #[must_use]
    pub fn current_lines(&self) -> u64 {
        self.state.lock().current_lines
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "file"
    }

    fn append(&self, record: &Record) -> Result<()> {
        let mut line = self.output_format.format(record, false)?;
        line.push('\n');

        let mut state = self.state.lock();
        if state.writer.is_none() {
            return Err(LoggerError::closed(self.base_path.display().to_string()));
        }

        if self.should_rotate(&state) {
            if let Err(e) = self.rotate(&mut state) {
                eprintln!("[WARN] Log rotation failed: {}. Continuing with current file.", e);

                if state.writer.is_none() {
                    match Self::open_state(&self.base_path) {
                        Ok(reopened) => *state = reopened,
                        Err(reopen_err) => {
                            eprintln!(
                                "[ERROR] Failed to reopen log file after rotation failure: {}",
                                reopen_err
                            );
                            return Err(e);
                        }
                    }
                }

                // Let the file outgrow its limits rather than retry on every write
                state.current_lines = 0;
                state.current_size = 0;
                state.open_date = Local::now().date_naive();
            }
        }

        let base_path = &self.base_path;
        let writer = state
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| {
                LoggerError::file_appender(
                    base_path.display().to_string(),
                    format!("Failed to write log entry: {}", e),
                )
            })?;

        state.current_size += line.len() as u64;
        state.current_lines += 1;
        Ok(())
    }
}

impl Closable for RotatingFileAppender {
    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.closed = true;
        if let Some(mut writer) = state.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to flush on close: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Reloadable for RotatingFileAppender {
    /// Re-open the configured path, e.g. after logrotate moved the file away.
    ///
    /// A closed appender is left closed.
    fn reload(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        if let Some(mut writer) = state.writer.take() {
            // The old handle may point at a moved file; losing its tail is not fatal
            let _ = writer.flush();
        }
        *state = Self::open_state(&self.base_path)?;
        Ok(())
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.state.get_mut().writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::Fields;
    use crate::core::log_level::LogLevel;
    use tempfile::tempdir;

    fn record(i: usize) -> Record {
        Record::new(LogLevel::Info, format!("message {}", i))
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_policy_builder() {
        let policy = RotationPolicy::new()
            .with_max_lines(10)
            .with_max_size_shift(10)
            .with_daily(false)
            .with_max_days(0)
            .with_max_files(3);

        assert_eq!(policy.max_lines, 10);
        assert_eq!(policy.max_bytes, 1024);
        assert!(!policy.daily);
        assert_eq!(policy.max_files, 3);
        assert!(policy.rotate);
    }

    #[test]
    fn test_default_policy() {
        let policy = RotationPolicy::default();
        assert_eq!(policy.max_lines, 1_000_000);
        assert_eq!(policy.max_bytes, 1 << 28);
        assert!(policy.daily);
        assert_eq!(policy.max_days, 7);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("nested").join("deeper").join("app.log");

        let appender = RotatingFileAppender::new(&log_path, OutputFormat::Text).unwrap();
        assert_eq!(appender.path(), log_path);
        assert!(log_path.exists());
        assert_eq!(appender.current_size(), 0);
    }

    #[test]
    fn test_picks_up_existing_lines() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("existing.log");
        fs::write(&log_path, "a\nb\nc\n").unwrap();

        let appender = RotatingFileAppender::new(&log_path, OutputFormat::Text).unwrap();
        assert_eq!(appender.current_lines(), 3);
        assert_eq!(appender.current_size(), 6);
    }

    #[test]
    fn test_rotate_then_write_keeps_triggering_record() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("lines.log");
        let policy = RotationPolicy::new().with_max_lines(2).with_daily(false);
        let appender = RotatingFileAppender::with_policy(&log_path, OutputFormat::Text, policy).unwrap();

        for i in 0..3 {
            appender.append(&record(i)).unwrap();
        }

        let rotated = appender.rotated_files();
        assert_eq!(rotated.len(), 1);
        let old = read_lines(&rotated[0]);
        assert_eq!(old.len(), 2);
        assert!(old[1].ends_with("msg=\"message 1\""));

        let current = read_lines(&log_path);
        assert_eq!(current.len(), 1);
        assert!(current[0].ends_with("msg=\"message 2\""));
    }

    #[test]
    fn test_size_rotation_loses_nothing() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("size.log");
        let policy = RotationPolicy::new()
            .with_max_lines(0)
            .with_max_size(200)
            .with_daily(false);
        let appender = RotatingFileAppender::with_policy(&log_path, OutputFormat::Text, policy).unwrap();

        for i in 0..40 {
            appender.append(&record(i)).unwrap();
        }

        let mut total = read_lines(&log_path).len();
        for path in appender.rotated_files() {
            total += read_lines(&path).len();
        }
        assert_eq!(total, 40);
        assert!(!appender.rotated_files().is_empty());
    }

    #[test]
    fn test_rotated_file_naming() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("named.log");
        let policy = RotationPolicy::new().with_max_lines(1).with_daily(false);
        let appender = RotatingFileAppender::with_policy(&log_path, OutputFormat::Text, policy).unwrap();

        for i in 0..3 {
            appender.append(&record(i)).unwrap();
        }

        let today = Local::now().format("%Y-%m-%d").to_string();
        let names: Vec<String> = appender
            .rotated_files()
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![format!("named.log.{}.001", today), format!("named.log.{}.002", today)]
        );
    }

    #[test]
    fn test_max_files_retention() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("retained.log");
        let policy = RotationPolicy::new()
            .with_max_lines(1)
            .with_daily(false)
            .with_max_files(2);
        let appender = RotatingFileAppender::with_policy(&log_path, OutputFormat::Text, policy).unwrap();

        for i in 0..6 {
            appender.append(&record(i)).unwrap();
        }

        let rotated = appender.rotated_files();
        assert_eq!(rotated.len(), 2);
        // Newest rotated file holds the record written just before the last one
        assert!(read_lines(&rotated[1])[0].ends_with("msg=\"message 4\""));
    }

    #[test]
    fn test_no_rotation_when_disabled() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("never.log");
        let policy = RotationPolicy::new().with_rotate(false).with_max_lines(1);
        let appender = RotatingFileAppender::with_policy(&log_path, OutputFormat::Text, policy).unwrap();

        for i in 0..10 {
            appender.append(&record(i)).unwrap();
        }

        assert!(appender.rotated_files().is_empty());
        assert_eq!(read_lines(&log_path).len(), 10);
    }

    #[test]
    fn test_daily_rotation_on_date_change() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("daily.log");
        let policy = RotationPolicy::new().with_max_lines(0).with_max_size(0);
        let appender = RotatingFileAppender::with_policy(&log_path, OutputFormat::Text, policy).unwrap();

        appender.append(&record(0)).unwrap();
        {
            let mut state = appender.state.lock();
            state.open_date = state.open_date.pred_opt().unwrap();
        }
        appender.append(&record(1)).unwrap();

        assert_eq!(appender.rotated_files().len(), 1);
        assert_eq!(read_lines(&log_path).len(), 1);
    }

    #[test]
    fn test_close_then_append_fails() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("closed.log");
        let appender = RotatingFileAppender::new(&log_path, OutputFormat::Text).unwrap();

        appender.append(&record(0)).unwrap();
        appender.close().unwrap();
        appender.close().unwrap();

        let err = appender.append(&record(1)).unwrap_err();
        assert!(matches!(err, LoggerError::AppenderClosed { .. }));
        assert_eq!(read_lines(&log_path).len(), 1);
    }

    #[test]
    fn test_reload_reopens_moved_file() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("reload.log");
        let moved = dir.path().join("reload.log.moved");
        let appender = RotatingFileAppender::new(&log_path, OutputFormat::Text).unwrap();

        appender.append(&record(0)).unwrap();
        fs::rename(&log_path, &moved).unwrap();
        appender.reload().unwrap();
        appender
            .append(&Record::new(LogLevel::Warn, "after reload").with_fields(Fields::new().with("k", 1)))
            .unwrap();

        assert_eq!(read_lines(&moved).len(), 1);
        let current = read_lines(&log_path);
        assert_eq!(current.len(), 1);
        assert!(current[0].ends_with("msg=\"after reload\" k=1"));
        assert_eq!(appender.current_lines(), 1);
    }

    #[test]
    fn test_reload_after_close_stays_closed() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("reopen.log");
        let appender = RotatingFileAppender::new(&log_path, OutputFormat::Json).unwrap();

        appender.append(&record(0)).unwrap();
        appender.close().unwrap();
        appender.reload().unwrap();

        let err = appender.append(&record(1)).unwrap_err();
        assert!(matches!(err, LoggerError::AppenderClosed { .. }));
        assert_eq!(read_lines(&log_path).len(), 1);
    }
}
