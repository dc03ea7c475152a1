//! Console appender implementation

use crate::core::{Appender, OutputFormat, Record, Result};
use parking_lot::Mutex;
use std::io::{IsTerminal, Write};

pub struct ConsoleAppender {
    writer: Mutex<Box<dyn Write + Send>>,
    output_format: OutputFormat,
    terminal: bool,
}

impl ConsoleAppender {
    /// Console appender writing to stdout
    pub fn new(format: OutputFormat) -> Self {
        let terminal = std::io::stdout().is_terminal();
        Self::from_parts(Box::new(std::io::stdout()), format, terminal)
    }

    /// Console appender writing to stderr
    pub fn stderr(format: OutputFormat) -> Self {
        let terminal = std::io::stderr().is_terminal();
        Self::from_parts(Box::new(std::io::stderr()), format, terminal)
    }

    /// Console appender writing to any target, e.g. a buffer in tests
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_registry::appenders::ConsoleAppender;
    /// use rust_log_registry::OutputFormat;
    ///
    /// let appender = ConsoleAppender::with_writer(Vec::new(), OutputFormat::Json);
    /// ```
    pub fn with_writer<W: Write + Send + 'static>(writer: W, format: OutputFormat) -> Self {
        Self::from_parts(Box::new(writer), format, false)
    }

    fn from_parts(writer: Box<dyn Write + Send>, output_format: OutputFormat, terminal: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            output_format,
            terminal,
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }
}

impl Appender for ConsoleAppender {
    fn append(&self, record: &Record) -> Result<()> {
        let mut line = self.output_format.format(record, self.terminal)?;
        line.push('\n');

        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
