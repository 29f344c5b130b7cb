use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Forwards the logging port to `tracing`, so lines share the binary's subscriber.
pub struct TracingLogger {
    session: String,
}

impl TracingLogger {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
        }
    }
}

impl DomainLogger for TracingLogger {
    fn debug(&self, msg: &str) {
        tracing::debug!(session = %self.session, "{}", msg);
    }

    fn info(&self, msg: &str) {
        tracing::info!(session = %self.session, "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(session = %self.session, "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(session = %self.session, "{}", msg);
    }
}

pub fn init_tracing_logger(session: &str) -> DynLogger {
    Arc::new(TracingLogger::new(session))
}

struct NoopLogger;

impl DomainLogger for NoopLogger {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Swallows everything; the default in unit tests.
pub fn init_noop_logger() -> DynLogger {
    Arc::new(NoopLogger)
}
