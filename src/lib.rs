//! # Rust Log Registry
//!
//! A process-wide registry of named, context-bound loggers writing through a
//! live-reconfigurable set of sinks.
//!
//! ## Features
//!
//! - **Named Loggers**: one logger per name, bound to `logger=<name>` and
//!   any extra context given on first lookup
//! - **Per-Sink Filters**: every sink has a default threshold plus per-name
//!   overrides
//! - **Live Reconfiguration**: loggers handed out earlier follow the new
//!   sink set without being looked up again
//! - **Sinks**: console, rotating file and syslog
//!
//! ## Example
//!
//! ```
//! use rust_log_registry::prelude::*;
//! use rust_log_registry::{fields, info};
//! use std::sync::Arc;
//!
//! let registry = LogRegistry::new();
//! registry.initialize(vec![SinkDescriptor::new(
//!     Arc::new(ConsoleAppender::stderr(OutputFormat::Text)),
//!     LogLevel::Warn,
//! )
//! .with_filter("db", LogLevel::Debug)]);
//!
//! let db = registry.logger_with("db", fields! { "pool" => "primary" });
//! db.debug("connection acquired", fields! { "wait_ms" => 3 });
//! info!(db, "pool size {}", 8);
//! ```

pub mod appenders;
pub mod config;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, Facility, RotatingFileAppender, RotationPolicy, SyslogAppender};
    pub use crate::config::{ConfigSection, LogConfig};
    pub use crate::core::{
        allow, Appender, Closable, CompositeLogger, FieldValue, Fields, LogLevel, LogRegistry,
        LoggerError, LoggerMetrics, NamedLogger, OutputFormat, Record, Reloadable, Result,
        SinkDescriptor,
    };
}

pub use crate::appenders::{ConsoleAppender, RotatingFileAppender, SyslogAppender};
pub use crate::config::{ConfigSection, LogConfig};
pub use crate::core::{
    allow, Appender, Closable, CompositeLogger, FieldValue, Fields, LogLevel, LogRegistry, LoggerError,
    LoggerMetrics, NamedLogger, OutputFormat, Record, Reloadable, Result, SinkDescriptor,
};

/// Logger for `name` on the process-wide registry
pub fn logger(name: &str) -> std::sync::Arc<NamedLogger> {
    LogRegistry::global().logger(name)
}
