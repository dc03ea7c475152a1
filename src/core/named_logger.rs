//! Context-bound logger with a swappable delegate
//!
//! A `NamedLogger` keeps its identity for the lifetime of the registry that
//! created it. Reconfiguration only replaces the composite it writes through,
//! so an `Arc<NamedLogger>` grabbed at start-up keeps following the active
//! configuration without being looked up again. Loggers derived with
//! [`NamedLogger::with_prefix`] or [`NamedLogger::with_suffix`] share the
//! delegate cell of the logger they came from, so they follow it too.

use super::composite::CompositeLogger;
use super::error::Result;
use super::fields::Fields;
use super::log_level::LogLevel;
use super::metrics::LoggerMetrics;
use super::record::{Record, LOGGER_KEY};
use super::registry::RegistryInner;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

pub struct NamedLogger {
    name: Option<String>,
    context: Fields,
    /// Appended after the call-site fields
    suffix: Fields,
    delegate: Arc<RwLock<Arc<CompositeLogger>>>,
    registry: Weak<RegistryInner>,
    metrics: Arc<LoggerMetrics>,
}

impl NamedLogger {
    pub(crate) fn new(
        name: Option<String>,
        context: Fields,
        delegate: CompositeLogger,
        registry: Weak<RegistryInner>,
        metrics: Arc<LoggerMetrics>,
    ) -> Self {
        Self {
            name,
            context,
            suffix: Fields::new(),
            delegate: Arc::new(RwLock::new(Arc::new(delegate))),
            registry,
            metrics,
        }
    }

    /// `None` for the root logger
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Fields prepended to every record, starting with `logger=<name>`
    pub fn context(&self) -> &Fields {
        &self.context
    }

    /// Fields appended after the call-site fields of every record
    pub fn suffix(&self) -> &Fields {
        &self.suffix
    }

    /// Snapshot of the composite currently written through
    pub fn delegate(&self) -> Arc<CompositeLogger> {
        Arc::clone(&self.delegate.read())
    }

    pub(crate) fn set_delegate(&self, composite: CompositeLogger) {
        *self.delegate.write() = Arc::new(composite);
    }

    /// Emit a bare key/value record behind the bound context
    pub fn log(&self, fields: Fields) -> Result<()> {
        self.write(Record::raw(fields))
    }

    /// Emit a fully built record behind the bound context.
    ///
    /// The delegate stays read-locked until every sink has been attempted,
    /// so a concurrent reconfiguration cannot split one record across two
    /// sink sets.
    pub fn write(&self, mut record: Record) -> Result<()> {
        record.prepend(&self.context);
        if !self.suffix.is_empty() {
            record.fields.extend(self.suffix.clone());
        }

        let result = {
            let delegate = self.delegate.read();
            delegate.write(&record)
        };

        match result {
            Ok(()) => {
                self.metrics.record_written();
                Ok(())
            }
            Err(e) => {
                self.metrics.record_write_failure();
                Err(e)
            }
        }
    }

    /// Emit a leveled, timestamped record.
    ///
    /// Never fails: a sink error is reported on stderr instead of being
    /// returned to the caller.
    pub fn log_at(&self, level: LogLevel, message: impl Into<String>, fields: Fields) {
        let record = Record::new(level, message).with_fields(fields);
        if let Err(e) = self.write(record) {
            eprintln!(
                "[LOGGER ERROR] Logging error (logger={}): {}",
                self.name.as_deref().unwrap_or("root"),
                e
            );
        }
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>, fields: Fields) {
        self.log_at(LogLevel::Trace, message, fields);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>, fields: Fields) {
        self.log_at(LogLevel::Debug, message, fields);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>, fields: Fields) {
        self.log_at(LogLevel::Info, message, fields);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>, fields: Fields) {
        self.log_at(LogLevel::Warn, message, fields);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>, fields: Fields) {
        self.log_at(LogLevel::Error, message, fields);
    }

    #[inline]
    pub fn critical(&self, message: impl Into<String>, fields: Fields) {
        self.log_at(LogLevel::Critical, message, fields);
    }

    /// Logger for `name` carrying this logger's context followed by `extra`.
    ///
    /// An empty name gives back this same logger. The `logger` key of this
    /// logger is not inherited; the child gets its own. If `name` is already
    /// registered the cached logger is returned unchanged.
    pub fn child(self: &Arc<Self>, name: &str, extra: Fields) -> Arc<NamedLogger> {
        if name.is_empty() {
            return Arc::clone(self);
        }

        let Some(registry) = self.registry.upgrade() else {
            return Arc::clone(self);
        };

        let mut context = self.context.without(LOGGER_KEY);
        context.extend(extra);
        registry.lookup(name, context)
    }

    /// Logger writing through the same sinks with `fields` ahead of this
    /// logger's context.
    ///
    /// The result is not registered under any name; it keeps following
    /// reconfiguration through the shared delegate.
    pub fn with_prefix(&self, fields: Fields) -> Arc<NamedLogger> {
        let mut context = fields;
        context.extend(self.context.clone());
        Arc::new(self.derive(context, self.suffix.clone()))
    }

    /// Logger writing through the same sinks with `fields` after the
    /// call-site fields of every record.
    pub fn with_suffix(&self, fields: Fields) -> Arc<NamedLogger> {
        let mut suffix = self.suffix.clone();
        suffix.extend(fields);
        Arc::new(self.derive(self.context.clone(), suffix))
    }

    fn derive(&self, context: Fields, suffix: Fields) -> NamedLogger {
        NamedLogger {
            name: self.name.clone(),
            context,
            suffix,
            delegate: Arc::clone(&self.delegate),
            registry: self.registry.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl std::fmt::Debug for NamedLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedLogger")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("suffix", &self.suffix)
            .finish()
    }
}
