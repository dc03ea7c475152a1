//! Error types for the logger registry

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A mode was requested that has no configuration section
    #[error("Unknown log mode '{mode}': missing section [log.{mode}]")]
    UnknownMode { mode: String },

    /// A configured mode produced no handler
    #[error("Handler is uninitialized for mode '{mode}'")]
    HandlerUninitialized { mode: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File appender error with path
    #[error("File appender error for '{path}': {message}")]
    FileAppenderError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Syslog connection or write error
    #[error("Syslog error for '{address}': {message}")]
    SyslogError { address: String, message: String },

    /// Write attempted after the appender released its resources
    #[error("Appender '{name}' is closed")]
    AppenderClosed { name: String },

    /// Key/value list with a dangling key
    #[error("Odd number of key/value elements: {len}")]
    OddKeyvals { len: usize },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn unknown_mode(mode: impl Into<String>) -> Self {
        LoggerError::UnknownMode { mode: mode.into() }
    }

    pub fn handler_uninitialized(mode: impl Into<String>) -> Self {
        LoggerError::HandlerUninitialized { mode: mode.into() }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file appender error
    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppenderError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn syslog(address: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SyslogError {
            address: address.into(),
            message: message.into(),
        }
    }

    pub fn closed(name: impl Into<String>) -> Self {
        LoggerError::AppenderClosed { name: name.into() }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }
}
