mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;

mod formatter;
pub use formatter::{DefaultFormatter, NON_PRINTABLE, PayloadFormatter};
