//! Sink implementations

pub mod console;
pub mod rotating_file;
pub mod syslog;

pub use console::ConsoleAppender;
pub use rotating_file::{RotatingFileAppender, RotationPolicy};
pub use self::syslog::{Facility, SyslogAppender};

pub use crate::core::{Appender, Closable, Reloadable};
