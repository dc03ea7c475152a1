//! Output format configuration for log records
//!
//! - Console: logfmt, with the level value coloured when writing to a terminal
//! - Text: logfmt (`key=value` pairs)
//! - Json: one JSON object per record, keys in record order
//!
//! Every format renders the reserved keys (`t`, `lvl`, `msg`) first and then
//! the record's visible fields, each exactly once.

use super::error::Result;
use super::fields::FieldValue;
use super::record::{Record, LEVEL_KEY};
use colored::Colorize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Terminal-friendly logfmt
    ///
    /// Example: `t=2025-01-08T10:30:45.123+0000 lvl=info msg="Request processed"`
    Console,

    /// Logfmt (key=value pairs)
    #[default]
    Text,

    /// JSON format for machine processing
    ///
    /// Example: `{"t":"2025-01-08T10:30:45.123+0000","lvl":"info","msg":"Request processed"}`
    Json,
}

impl OutputFormat {
    /// Resolve a configured format name. Unknown names fall back to text.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "console" => OutputFormat::Console,
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }

    /// Render one record without the trailing newline.
    ///
    /// `terminal` only matters for the console format.
    pub fn format(&self, record: &Record, terminal: bool) -> Result<String> {
        match self {
            OutputFormat::Console => Ok(self.format_logfmt(record, terminal)),
            OutputFormat::Text => Ok(self.format_logfmt(record, false)),
            OutputFormat::Json => self.format_json(record),
        }
    }

    fn format_logfmt(&self, record: &Record, colorize: bool) -> String {
        let mut parts = Vec::with_capacity(3 + record.fields.len());

        for (key, value) in record.reserved() {
            let rendered = self.logfmt_value(&value);
            if colorize && key == LEVEL_KEY {
                if let Some(level) = record.level {
                    parts.push(format!("{}={}", key, rendered.color(level.color_code())));
                    continue;
                }
            }
            parts.push(format!("{}={}", key, rendered));
        }

        for (key, value) in record.visible_fields() {
            parts.push(format!("{}={}", self.escape_logfmt_key(key), self.logfmt_value(value)));
        }

        parts.join(" ")
    }

    fn format_json(&self, record: &Record) -> Result<String> {
        let mut out = String::from("{");
        let mut first = true;

        let reserved = record.reserved();
        let pairs = reserved
            .iter()
            .map(|(k, v)| (*k, v))
            .chain(record.visible_fields().map(|(k, v)| (k.as_str(), v)));

        for (key, value) in pairs {
            if !first {
                out.push(',');
            }
            first = false;
            out.push_str(&serde_json::to_string(key)?);
            out.push(':');
            out.push_str(&serde_json::to_string(&value.to_json_value())?);
        }

        out.push('}');
        Ok(out)
    }

    fn logfmt_value(&self, value: &FieldValue) -> String {
        match value {
            FieldValue::String(s) => self.escape_logfmt_value(s),
            other => other.to_string(),
        }
    }

    /// Escape a logfmt key.
    ///
    /// Keys outside `[alnum_-.]+` are quoted rather than stripped, so no
    /// caller key can render as a bare reserved key or collide with another.
    fn escape_logfmt_key(&self, key: &str) -> String {
        let bare = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if bare {
            key.to_string()
        } else {
            self.quote_logfmt_value(key)
        }
    }

    /// Escape a logfmt value (quote if it needs it)
    fn escape_logfmt_value(&self, value: &str) -> String {
        let needs_quotes = value.is_empty()
            || value
                .chars()
                .any(|c| c == ' ' || c == '"' || c == '=' || c.is_control());
        if needs_quotes {
            self.quote_logfmt_value(value)
        } else {
            value.to_string()
        }
    }

    /// Quote a logfmt value, escaping anything that could break the line
    fn quote_logfmt_value(&self, value: &str) -> String {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t");
        format!("\"{}\"", escaped)
    }
}
