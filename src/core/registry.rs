//! Registry of named loggers over one active sink configuration
//!
//! The registry owns the root logger, the name -> logger map, the descriptor
//! list last passed to [`LogRegistry::initialize`], and the handlers that
//! need explicit close or reload. A fresh registry logs to stderr at `info`,
//! so it is usable before any configuration has been loaded.

use super::appender::{Closable, Reloadable};
use super::composite::CompositeLogger;
use super::descriptor::SinkDescriptor;
use super::error::{LoggerError, Result};
use super::fields::Fields;
use super::filter::FilteredAppender;
use super::log_level::LogLevel;
use super::metrics::LoggerMetrics;
use super::named_logger::NamedLogger;
use super::output_format::OutputFormat;
use super::record::LOGGER_KEY;
use crate::appenders::ConsoleAppender;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

static GLOBAL: Lazy<LogRegistry> = Lazy::new(LogRegistry::new);

/// Cheaply clonable handle; clones share one registry.
///
/// # Example
///
/// ```
/// use rust_log_registry::{fields, LogRegistry};
///
/// let registry = LogRegistry::new();
/// let db = registry.logger("db");
/// db.info("connected", fields! { "pool" => 4 });
///
/// // Same name, same logger
/// assert!(std::sync::Arc::ptr_eq(&db, &registry.logger("db")));
/// ```
#[derive(Clone)]
pub struct LogRegistry {
    inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    root: Arc<NamedLogger>,
    state: RwLock<RegistryState>,
    lifecycle: Mutex<Lifecycle>,
    metrics: Arc<LoggerMetrics>,
}

struct RegistryState {
    loggers: HashMap<String, Arc<NamedLogger>>,
    descriptors: Vec<SinkDescriptor>,
}

#[derive(Default)]
struct Lifecycle {
    closers: Vec<Arc<dyn Closable>>,
    reloaders: Vec<Arc<dyn Reloadable>>,
}

impl Lifecycle {
    fn from_descriptors(descriptors: &[SinkDescriptor]) -> Self {
        Self {
            closers: descriptors.iter().filter_map(|d| d.closer().cloned()).collect(),
            reloaders: descriptors.iter().filter_map(|d| d.reloader().cloned()).collect(),
        }
    }
}

/// Console sink installed before any configuration is applied
pub fn default_descriptor() -> SinkDescriptor {
    SinkDescriptor::new(
        Arc::new(ConsoleAppender::stderr(OutputFormat::Console)),
        LogLevel::Info,
    )
}

/// Composite for one logger name, or the root's when `name` is `None`
fn build_composite(descriptors: &[SinkDescriptor], name: Option<&str>) -> CompositeLogger {
    let sinks = descriptors
        .iter()
        .map(|d| {
            let threshold = match name {
                Some(name) => d.threshold_for(name),
                None => d.level(),
            };
            FilteredAppender::new(Arc::clone(d.appender()), threshold)
        })
        .collect();
    CompositeLogger::new(sinks)
}

fn same_closer(a: &Arc<dyn Closable>, b: &Arc<dyn Closable>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl RegistryInner {
    /// Cached logger for `name`, or a new one bound to `logger=<name>` plus `context`
    pub(crate) fn lookup(self: &Arc<Self>, name: &str, context: Fields) -> Arc<NamedLogger> {
        if name.is_empty() {
            return Arc::clone(&self.root);
        }

        if let Some(logger) = self.state.read().loggers.get(name) {
            return Arc::clone(logger);
        }

        let mut state = self.state.write();
        // Another thread may have registered the name between the two locks
        if let Some(logger) = state.loggers.get(name) {
            return Arc::clone(logger);
        }

        let mut bound = Fields::new().with(LOGGER_KEY, name);
        bound.extend(context.without(LOGGER_KEY));

        let logger = Arc::new(NamedLogger::new(
            Some(name.to_string()),
            bound,
            build_composite(&state.descriptors, Some(name)),
            Arc::downgrade(self),
            Arc::clone(&self.metrics),
        ));
        state.loggers.insert(name.to_string(), Arc::clone(&logger));
        logger
    }
}

impl LogRegistry {
    /// Registry with the default console sink
    pub fn new() -> Self {
        Self::with_descriptors(vec![default_descriptor()])
    }

    /// Registry starting from an explicit sink set
    pub fn with_descriptors(descriptors: Vec<SinkDescriptor>) -> Self {
        let metrics = Arc::new(LoggerMetrics::new());
        let lifecycle = Lifecycle::from_descriptors(&descriptors);
        let inner = Arc::new_cyclic(|weak| RegistryInner {
            root: Arc::new(NamedLogger::new(
                None,
                Fields::new(),
                build_composite(&descriptors, None),
                weak.clone(),
                Arc::clone(&metrics),
            )),
            state: RwLock::new(RegistryState {
                loggers: HashMap::new(),
                descriptors,
            }),
            lifecycle: Mutex::new(lifecycle),
            metrics,
        });
        Self { inner }
    }

    /// Process-wide default instance, created on first use
    pub fn global() -> &'static LogRegistry {
        &GLOBAL
    }

    /// The context-free logger every unnamed lookup resolves to
    pub fn root(&self) -> Arc<NamedLogger> {
        Arc::clone(&self.inner.root)
    }

    /// Logger bound to `logger=<name>`; an empty name yields the root
    pub fn logger(&self, name: &str) -> Arc<NamedLogger> {
        self.inner.lookup(name, Fields::new())
    }

    /// Like [`logger`](Self::logger) with extra context bound on first creation.
    ///
    /// The first request for a name decides its context; later requests get
    /// the cached logger whatever context they pass.
    pub fn logger_with(&self, name: &str, context: Fields) -> Arc<NamedLogger> {
        self.inner.lookup(name, context)
    }

    /// Install a new sink set.
    ///
    /// The root gets each sink's default threshold, every registered name
    /// gets its overrides. Loggers handed out earlier observe the new sinks
    /// on their next write. Closers registered by the previous set and absent
    /// from the new one are closed once the swap is done.
    pub fn initialize(&self, descriptors: Vec<SinkDescriptor>) {
        let previous = {
            let mut state = self.inner.state.write();

            self.inner
                .root
                .set_delegate(build_composite(&descriptors, None));

            let mut names: Vec<&String> = state.loggers.keys().collect();
            names.sort();
            for name in names {
                state.loggers[name].set_delegate(build_composite(&descriptors, Some(name)));
            }

            let fresh = Lifecycle::from_descriptors(&descriptors);
            state.descriptors = descriptors;
            std::mem::replace(&mut *self.inner.lifecycle.lock(), fresh)
        };

        let current = self.inner.lifecycle.lock().closers.clone();
        for closer in previous.closers {
            if current.iter().any(|c| same_closer(c, &closer)) {
                continue;
            }
            if let Err(e) = closer.close() {
                eprintln!("[LOGGER ERROR] Failed to close replaced handler: {}", e);
            }
        }

        self.inner.metrics.record_reconfiguration();
    }

    /// Close every registered closable handler.
    ///
    /// All handlers are attempted; the first error is returned. Closers and
    /// reloaders are both emptied, so a second call is a no-op and a later
    /// `reload` cannot reopen a released handle.
    pub fn close(&self) -> Result<()> {
        let closers = {
            let mut lifecycle = self.inner.lifecycle.lock();
            lifecycle.reloaders.clear();
            std::mem::take(&mut lifecycle.closers)
        };

        let mut first_err: Option<LoggerError> = None;
        for closer in closers {
            if let Err(e) = closer.close() {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Reload every reloadable handler, stopping at the first failure
    pub fn reload(&self) -> Result<()> {
        let reloaders = self.inner.lifecycle.lock().reloaders.clone();
        for reloader in reloaders {
            reloader.reload()?;
        }
        self.inner.metrics.record_reload();
        Ok(())
    }

    /// Descriptors currently installed
    pub fn descriptors(&self) -> Vec<SinkDescriptor> {
        self.inner.state.read().descriptors.clone()
    }

    /// Registered logger names, sorted
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.state.read().loggers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn closable_count(&self) -> usize {
        self.inner.lifecycle.lock().closers.len()
    }

    pub fn reloadable_count(&self) -> usize {
        self.inner.lifecycle.lock().reloaders.len()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.inner.metrics
    }
}

impl Default for LogRegistry {
    fn default() -> Self {
        Self::new()
    }
}
