mod config;
mod error;
mod format;
mod log;

pub use config::{DASHBOARD_TARGETS, LoggerConfig};
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Installs the global `tracing` subscriber described by `cfg`.
///
/// Can succeed once per process; later calls return [`LoggerError::AlreadyInstalled`].
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    log::install(cfg)
}
