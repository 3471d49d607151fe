use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid value provided for {param}: {value:?}")]
    InvalidParameter { param: &'static str, value: String },

    #[error("time window must have a positive duration")]
    EmptyWindow,

    #[error("time window start is out of range")]
    WindowOutOfRange,

    #[error("unknown task state: {0}")]
    UnknownState(String),
}
