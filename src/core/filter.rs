//! Severity gate placed in front of every appender

use super::appender::Appender;
use super::error::Result;
use super::log_level::LogLevel;
use super::record::Record;
use std::sync::Arc;

/// True iff a record at `level` passes a gate set to `threshold`
#[inline]
pub fn allow(level: LogLevel, threshold: LogLevel) -> bool {
    level >= threshold
}

/// An appender paired with the minimum level one logger name lets through
#[derive(Clone)]
pub struct FilteredAppender {
    appender: Arc<dyn Appender>,
    threshold: LogLevel,
}

impl FilteredAppender {
    pub fn new(appender: Arc<dyn Appender>, threshold: LogLevel) -> Self {
        Self { appender, threshold }
    }

    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    pub fn appender(&self) -> &Arc<dyn Appender> {
        &self.appender
    }

    /// Records without a level are never filtered out
    pub fn accepts(&self, record: &Record) -> bool {
        record.level.map_or(true, |level| allow(level, self.threshold))
    }

    /// Append the record if it passes the gate. Suppressed records are not an error.
    pub fn write(&self, record: &Record) -> Result<()> {
        if !self.accepts(record) {
            return Ok(());
        }
        self.appender.append(record)
    }
}

impl std::fmt::Debug for FilteredAppender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredAppender")
            .field("appender", &self.appender.name())
            .field("threshold", &self.threshold)
            .finish()
    }
}
