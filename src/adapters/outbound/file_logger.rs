use crate::domains::logger::{DomainLogger, DynLogger};
use chrono::Utc;
use std::sync::Arc;

/// Bridges the logging port onto the `log` facade, which `fast_log` writes to file.
struct FileBridge;

impl DomainLogger for FileBridge {
    fn debug(&self, msg: &str) {
        log::debug!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn info(&self, msg: &str) {
        log::info!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn warn(&self, msg: &str) {
        log::warn!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn error(&self, msg: &str) {
        log::error!("{} - {}", Utc::now().to_rfc3339(), msg);
    }
}

/// Initialize `fast_log` with console and file appenders and return a logger
/// the controller can be injected with. Only one global logger can exist per process.
pub fn init_file_logger(path: &str) -> Result<DynLogger, String> {
    fast_log::init(
        fast_log::config::Config::new()
            .console()
            .file(path)
            .level(log::LevelFilter::Info),
    )
    .map_err(|e| format!("Failed to initialize fast_log at {}: {}", path, e))?;
    Ok(Arc::new(FileBridge))
}
