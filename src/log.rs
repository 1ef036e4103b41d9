//! Logging sink for pipeline traces and failures

use std::rc::Rc;
use std::sync::Arc;

/// Receives the pipeline's debug traces and error reports.
pub trait LogSink {
    fn debug(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default sink: forwards to `tracing` under the `masked_config` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "masked_config", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "masked_config", "{}", message);
    }
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn debug(&self, message: &str) {
        (**self).debug(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }
}

impl<T: LogSink + ?Sized> LogSink for Rc<T> {
    fn debug(&self, message: &str) {
        (**self).debug(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }
}
