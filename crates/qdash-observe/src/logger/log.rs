use std::error::Error as _;

use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = directive_filter(&cfg.level)?;

    match cfg.format {
        LoggerFormat::Text => {
            let layer = fmt::layer()
                .with_ansi(cfg.use_color)
                .with_target(cfg.with_targets)
                .with_timer(local_timer());
            try_install(tracing_subscriber::registry().with(filter).with(layer))
        }
        LoggerFormat::Json => {
            let layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_target(cfg.with_targets)
                .with_timer(local_timer());
            try_install(tracing_subscriber::registry().with(filter).with(layer))
        }
        LoggerFormat::Journald => journald(filter),
    }
}

pub(crate) fn directive_filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directive).map_err(|e| LoggerError::InvalidDirective {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn install_error(err: TryInitError) -> LoggerError {
    let already = err
        .source()
        .is_some_and(|cause| cause.is::<SetGlobalDefaultError>());
    if already {
        LoggerError::AlreadyInstalled
    } else {
        LoggerError::InstallFailed(err.to_string())
    }
}

fn try_install<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(install_error)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald(filter: EnvFilter) -> Result<(), LoggerError> {
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::InstallFailed(format!("journald socket: {e}")))?
        .with_syslog_identifier("qdashd".to_string());
    try_install(tracing_subscriber::registry().with(filter).with(layer))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald(_filter: EnvFilter) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_scoped_directives() {
        let cfg = LoggerConfig::default().with_level("trace");
        assert!(directive_filter(&cfg.level).is_ok());
    }

    #[test]
    fn filter_rejection_names_the_directive() {
        let err = directive_filter("qdash_core=loud").unwrap_err();
        match err {
            LoggerError::InvalidDirective { directive, .. } => {
                assert_eq!(directive, "qdash_core=loud")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn second_install_is_reported_as_already_installed() {
        let cfg = LoggerConfig::default().with_level("error");
        let _ = install(&cfg);
        let err = install(&cfg.with_format(LoggerFormat::Json)).unwrap_err();
        assert!(matches!(err, LoggerError::AlreadyInstalled), "{err}");
    }
}
