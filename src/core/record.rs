//! Log record structure

use super::fields::{FieldValue, Fields};
use super::log_level::LogLevel;
use chrono::{DateTime, Local};

/// Key of the timestamp attached by the level helpers
pub const TIMESTAMP_KEY: &str = "t";
/// Key of the severity value
pub const LEVEL_KEY: &str = "lvl";
/// Key of the human readable message
pub const MESSAGE_KEY: &str = "msg";
/// Context key naming the logger a record came from
pub const LOGGER_KEY: &str = "logger";

/// Layout of the rendered timestamp
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// One log event.
///
/// Reserved values (`t`, `lvl`, `msg`) live in dedicated slots and are always
/// rendered first. A field reusing a reserved key is hidden whenever the
/// matching slot is set, so the reserved value can never be overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: Option<DateTime<Local>>,
    pub level: Option<LogLevel>,
    pub message: Option<String>,
    pub fields: Fields,
}

impl Record {
    /// Leveled record stamped with the current local time
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Some(Local::now()),
            level: Some(level),
            message: Some(message.into()),
            fields: Fields::new(),
        }
    }

    /// Bare key/value record without timestamp, level or message
    pub fn raw(fields: Fields) -> Self {
        Self {
            timestamp: None,
            level: None,
            message: None,
            fields,
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Put `context` in front of the record's own fields
    pub fn prepend(&mut self, context: &Fields) {
        if context.is_empty() {
            return;
        }
        let own = std::mem::take(&mut self.fields);
        let mut merged = context.clone();
        merged.extend(own);
        self.fields = merged;
    }

    pub fn formatted_timestamp(&self) -> Option<String> {
        self.timestamp
            .as_ref()
            .map(|t| t.format(TIMESTAMP_LAYOUT).to_string())
    }

    /// Reserved pairs in rendering order
    pub fn reserved(&self) -> Vec<(&'static str, FieldValue)> {
        let mut out = Vec::with_capacity(3);
        if let Some(ts) = self.formatted_timestamp() {
            out.push((TIMESTAMP_KEY, FieldValue::String(ts)));
        }
        if let Some(level) = self.level {
            out.push((LEVEL_KEY, FieldValue::from(level.to_str())));
        }
        if let Some(ref msg) = self.message {
            out.push((MESSAGE_KEY, FieldValue::String(msg.clone())));
        }
        out
    }

    /// Fields that survive the reserved-key precedence rule
    pub fn visible_fields(&self) -> impl Iterator<Item = &(String, FieldValue)> + '_ {
        self.fields.iter().filter(move |(key, _)| !self.shadows(key))
    }

    fn shadows(&self, key: &str) -> bool {
        match key {
            TIMESTAMP_KEY => self.timestamp.is_some(),
            LEVEL_KEY => self.level.is_some(),
            MESSAGE_KEY => self.message.is_some(),
            _ => false,
        }
    }
}
