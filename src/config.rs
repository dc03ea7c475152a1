//! Configuration loading
//!
//! Turns already-parsed `[log]` and `[log.<mode>]` key/value sections into
//! sink descriptors and installs them on a registry. Mode sections are read
//! in the order `modes` lists them, which is also fan-out order.
//!
//! # Example
//!
//! ```no_run
//! use rust_log_registry::config::{ConfigSection, LogConfig};
//! use rust_log_registry::LogRegistry;
//!
//! let config = LogConfig::new(["console", "file"])
//!     .with_logs_path("/var/log/myapp")
//!     .with_section("log", ConfigSection::new().with("level", "info"))
//!     .with_section("log.console", ConfigSection::new().with("format", "console"))
//!     .with_section(
//!         "log.file",
//!         ConfigSection::new().with("level", "warn").with("filters", "db:debug"),
//!     );
//!
//! let registry = LogRegistry::new();
//! registry.apply_config(&config)?;
//! # Ok::<(), rust_log_registry::LoggerError>(())
//! ```

use crate::appenders::syslog::{parse_facility, DEFAULT_FACILITY};
use crate::appenders::{ConsoleAppender, RotatingFileAppender, RotationPolicy, SyslogAppender};
use crate::core::{
    default_descriptor, Fields, LogLevel, LogRegistry, LoggerError, NamedLogger, OutputFormat, Result,
    SinkDescriptor,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// Section holding registry-wide defaults
pub const ROOT_SECTION: &str = "log";

/// Log file used when `[log.file] file_name` is not set
pub const DEFAULT_FILE_NAME: &str = "app.log";

/// Key/value pairs of one configuration section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSection(BTreeMap<String, String>);

impl ConfigSection {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Trimmed value; blank values count as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Boolean value, `default` when unset or unparsable
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(str::to_lowercase).as_deref() {
            Some("1" | "t" | "true" | "y" | "yes" | "on") => true,
            Some("0" | "f" | "false" | "n" | "no" | "off") => false,
            _ => default,
        }
    }

    /// Numeric value, `default` when unset or unparsable
    pub fn number_or<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
    }
}

/// Parsed logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Sink modes to activate, in order
    pub modes: Vec<String>,
    /// Directory for the default log file
    pub logs_path: PathBuf,
    /// `log`, `log.console`, `log.file`, `log.syslog`, ...
    pub sections: BTreeMap<String, ConfigSection>,
}

impl LogConfig {
    pub fn new<I, S>(modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modes: modes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_logs_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.logs_path = path.into();
        self
    }

    #[must_use]
    pub fn with_section(mut self, name: impl Into<String>, section: ConfigSection) -> Self {
        self.sections.insert(name.into(), section);
        self
    }

    pub fn section(&self, name: &str) -> Option<&ConfigSection> {
        self.sections.get(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeKind {
    Console,
    File,
    Syslog,
}

impl ModeKind {
    fn from_mode(mode: &str) -> Option<Self> {
        match mode {
            "console" => Some(ModeKind::Console),
            "file" => Some(ModeKind::File),
            "syslog" => Some(ModeKind::Syslog),
            _ => None,
        }
    }
}

/// One mode, validated and resolved, not yet built
#[derive(Debug)]
struct ModePlan {
    mode: String,
    kind: ModeKind,
    level: LogLevel,
    filters: HashMap<String, LogLevel>,
    format: OutputFormat,
    section: ConfigSection,
}

/// Resolve a level name; unknown names are reported through `root` and fail closed to `error`
pub fn parse_level(root: &NamedLogger, name: &str) -> LogLevel {
    match name.parse::<LogLevel>() {
        Ok(level) => level,
        Err(_) => {
            root.error("Unknown log level", Fields::new().with("level", name));
            LogLevel::Error
        }
    }
}

/// Parse `name:level` pairs separated by spaces or commas.
///
/// Entries without a `:` are ignored.
pub fn parse_filters(root: &NamedLogger, raw: &str) -> HashMap<String, LogLevel> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let mut parts = token.split(':');
            let name = parts.next()?;
            let level = parts.next()?;
            Some((name.to_string(), parse_level(root, level)))
        })
        .collect()
}

impl LogRegistry {
    /// Build sinks from `config` and install them.
    ///
    /// Every listed mode is validated before anything is touched, so an
    /// unknown mode leaves the running configuration intact. Handlers that
    /// fail to construct are reported through the root logger and skipped.
    /// When nothing could be built the default console sink is reinstalled.
    ///
    /// # Errors
    ///
    /// - `UnknownMode` when a listed mode has no `[log.<mode>]` section
    /// - `HandlerUninitialized` when a section exists but no sink type serves it
    /// - the first error of closing the previous handlers
    pub fn apply_config(&self, config: &LogConfig) -> Result<()> {
        let plans = self.plan(config)?;

        self.close()?;

        let mut descriptors = Vec::with_capacity(plans.len());
        for plan in plans {
            match build_descriptor(config, &plan) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => self.root().error(
                    "Failed to initialize log handler",
                    Fields::new()
                        .with("mode", plan.mode.as_str())
                        .with("err", e.to_string()),
                ),
            }
        }

        if descriptors.is_empty() {
            descriptors.push(default_descriptor());
        }

        self.initialize(descriptors);
        Ok(())
    }

    fn plan(&self, config: &LogConfig) -> Result<Vec<ModePlan>> {
        let root = self.root();
        let defaults = config.section(ROOT_SECTION).cloned().unwrap_or_default();
        let default_level = parse_level(&root, &defaults.string_or("level", "info"));
        let default_filters = parse_filters(&root, defaults.get("filters").unwrap_or(""));

        let mut plans = Vec::with_capacity(config.modes.len());
        for mode in config.modes.iter().map(|m| m.trim()).filter(|m| !m.is_empty()) {
            let section_name = format!("{}.{}", ROOT_SECTION, mode);
            let Some(section) = config.section(&section_name) else {
                root.error("Unknown log mode", Fields::new().with("mode", mode));
                return Err(LoggerError::unknown_mode(mode));
            };

            let Some(kind) = ModeKind::from_mode(mode) else {
                root.critical("Handler is uninitialized", Fields::new().with("mode", mode));
                return Err(LoggerError::handler_uninitialized(mode));
            };

            let level = match section.get("level") {
                Some(name) => parse_level(&root, name),
                None => default_level,
            };

            let mut filters = parse_filters(&root, section.get("filters").unwrap_or(""));
            for (name, threshold) in &default_filters {
                filters.entry(name.clone()).or_insert(*threshold);
            }

            plans.push(ModePlan {
                mode: mode.to_string(),
                kind,
                level,
                filters,
                format: OutputFormat::from_name(section.get("format").unwrap_or("")),
                section: section.clone(),
            });
        }

        Ok(plans)
    }
}

fn build_descriptor(config: &LogConfig, plan: &ModePlan) -> Result<SinkDescriptor> {
    let descriptor = match plan.kind {
        ModeKind::Console => SinkDescriptor::new(Arc::new(ConsoleAppender::new(plan.format)), plan.level),
        ModeKind::File => {
            let default_path = config.logs_path.join(DEFAULT_FILE_NAME);
            let path = plan
                .section
                .get("file_name")
                .map(PathBuf::from)
                .unwrap_or(default_path);

            let policy = RotationPolicy::new()
                .with_rotate(plan.section.bool_or("log_rotate", true))
                .with_max_lines(plan.section.number_or("max_lines", 1_000_000))
                .with_max_size_shift(plan.section.number_or("max_size_shift", 28))
                .with_daily(plan.section.bool_or("daily_rotate", true))
                .with_max_days(plan.section.number_or("max_days", 7))
                .with_max_files(plan.section.number_or("max_files", 0));

            let file = Arc::new(RotatingFileAppender::with_policy(path, plan.format, policy)?);
            SinkDescriptor::new(file.clone(), plan.level)
                .with_closer(file.clone())
                .with_reloader(file)
        }
        ModeKind::Syslog => {
            let facility = plan
                .section
                .get("facility")
                .map(parse_facility)
                .transpose()?
                .unwrap_or(DEFAULT_FACILITY);
            let syslog = Arc::new(SyslogAppender::connect(
                plan.section.get("network").unwrap_or(""),
                plan.section.get("address").unwrap_or(""),
                facility,
                plan.section.get("tag").unwrap_or(""),
                plan.format,
            )?);
            SinkDescriptor::new(syslog.clone(), plan.level).with_closer(syslog)
        }
    };

    Ok(descriptor.with_filters(plan.filters.clone()))
}
