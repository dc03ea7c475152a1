//! Logging macros for ergonomic log message formatting.
//!
//! The level macros format their message like `format!` and take optional
//! trailing fields after a `;`.
//!
//! # Examples
//!
//! ```
//! use rust_log_registry::{info, LogRegistry};
//!
//! let registry = LogRegistry::new();
//! let http = registry.logger("http");
//!
//! info!(http, "Server started");
//!
//! let port = 8080;
//! info!(http, "Server listening on port {}", port; "tls" => false);
//! ```

/// Build [`Fields`](crate::Fields) from `key => value` pairs, keeping their order.
///
/// ```
/// use rust_log_registry::fields;
///
/// let fields = fields! { "user" => "ada", "attempt" => 3 };
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Fields::new()$(.with($key, $value))+
    };
}

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_log_registry::{LogLevel, LogRegistry};
/// # let logger = LogRegistry::new().logger("doc");
/// use rust_log_registry::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500; "retry" => true);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $fmt:literal $(, $arg:expr)* ; $($key:expr => $value:expr),+ $(,)?) => {
        $logger.log_at($level, format!($fmt $(, $arg)*), $crate::fields!($($key => $value),+))
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_at($level, format!($($arg)+), $crate::Fields::new())
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
///
/// ```
/// # let logger = rust_log_registry::LogRegistry::new().root();
/// use rust_log_registry::critical;
/// critical!(logger, "Unable to recover from error: {}", "disk full"; "disk" => "/var");
/// ```
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}
