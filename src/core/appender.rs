//! Appender trait for log output destinations, plus optional lifecycle hooks

use super::{error::Result, record::Record};

/// A sink that renders records somewhere.
///
/// One appender is shared by the root composite and every named composite,
/// so implementations serialize their own writes.
pub trait Appender: Send + Sync {
    fn append(&self, record: &Record) -> Result<()>;
    fn name(&self) -> &str;
}

/// Sinks owning a resource that must be released explicitly
pub trait Closable: Send + Sync {
    /// Release owned resources. Calling it again must be harmless.
    fn close(&self) -> Result<()>;
}

/// Sinks able to re-open their destination in place, e.g. after external rotation
pub trait Reloadable: Send + Sync {
    fn reload(&self) -> Result<()>;
}
