//! One configured sink: appender, default threshold, per-name overrides and lifecycle hooks

use super::appender::{Appender, Closable, Reloadable};
use super::log_level::LogLevel;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct SinkDescriptor {
    appender: Arc<dyn Appender>,
    level: LogLevel,
    filters: HashMap<String, LogLevel>,
    closer: Option<Arc<dyn Closable>>,
    reloader: Option<Arc<dyn Reloadable>>,
}

impl SinkDescriptor {
    pub fn new(appender: Arc<dyn Appender>, level: LogLevel) -> Self {
        Self {
            appender,
            level,
            filters: HashMap::new(),
            closer: None,
            reloader: None,
        }
    }

    /// Override the threshold for one logger name
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, level: LogLevel) -> Self {
        self.filters.insert(name.into(), level);
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: HashMap<String, LogLevel>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Register the hook `close` calls on shutdown or reconfiguration
    #[must_use]
    pub fn with_closer(mut self, closer: Arc<dyn Closable>) -> Self {
        self.closer = Some(closer);
        self
    }

    /// Register the hook `reload` calls on external rotation
    #[must_use]
    pub fn with_reloader(mut self, reloader: Arc<dyn Reloadable>) -> Self {
        self.reloader = Some(reloader);
        self
    }

    /// Override for `name` if one exists, the sink's default otherwise
    pub fn threshold_for(&self, name: &str) -> LogLevel {
        self.filters.get(name).copied().unwrap_or(self.level)
    }

    pub fn appender(&self) -> &Arc<dyn Appender> {
        &self.appender
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn filters(&self) -> &HashMap<String, LogLevel> {
        &self.filters
    }

    pub fn closer(&self) -> Option<&Arc<dyn Closable>> {
        self.closer.as_ref()
    }

    pub fn reloader(&self) -> Option<&Arc<dyn Reloadable>> {
        self.reloader.as_ref()
    }
}

impl std::fmt::Debug for SinkDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkDescriptor")
            .field("appender", &self.appender.name())
            .field("level", &self.level)
            .field("filters", &self.filters)
            .field("closable", &self.closer.is_some())
            .field("reloadable", &self.reloader.is_some())
            .finish()
    }
}
