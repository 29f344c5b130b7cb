use std::sync::Arc;

/// Logging port injected into the application layer.
/// Non-fallible from the caller's point of view; adapters decide where lines go.
pub trait DomainLogger: Send + Sync + 'static {
    fn debug(&self, _msg: &str) {}
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;
