use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?}, use text, json or journald")]
    UnknownFormat(String),

    #[error("journald logging needs Linux and the `journald` feature of qdash-observe")]
    JournaldUnavailable,

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,

    #[error("cannot install tracing subscriber: {0}")]
    InstallFailed(String),

    #[error("invalid log filter {directive:?}: {reason}")]
    InvalidDirective { directive: String, reason: String },
}
