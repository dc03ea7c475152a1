//! Core registry types and traits

pub mod appender;
pub mod composite;
pub mod descriptor;
pub mod error;
pub mod fields;
pub mod filter;
pub mod log_level;
pub mod metrics;
pub mod named_logger;
pub mod output_format;
pub mod record;
pub mod registry;

pub use appender::{Appender, Closable, Reloadable};
pub use composite::CompositeLogger;
pub use descriptor::SinkDescriptor;
pub use error::{LoggerError, Result};
pub use fields::{FieldValue, Fields};
pub use filter::{allow, FilteredAppender};
pub use log_level::LogLevel;
pub use metrics::LoggerMetrics;
pub use named_logger::NamedLogger;
pub use output_format::OutputFormat;
pub use record::Record;
pub use registry::{default_descriptor, LogRegistry};
