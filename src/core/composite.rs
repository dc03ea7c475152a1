//! Ordered fan-out of one record to several filtered appenders

use super::error::Result;
use super::filter::FilteredAppender;
use super::record::Record;

#[derive(Debug, Clone, Default)]
pub struct CompositeLogger {
    sinks: Vec<FilteredAppender>,
}

impl CompositeLogger {
    pub fn new(sinks: Vec<FilteredAppender>) -> Self {
        Self { sinks }
    }

    pub fn sinks(&self) -> &[FilteredAppender] {
        &self.sinks
    }

    /// Write to every sink in order.
    ///
    /// A failing sink does not stop the ones after it; the first failure
    /// encountered is returned once all sinks have been attempted.
    pub fn write(&self, record: &Record) -> Result<()> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.write(record) {
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
}
