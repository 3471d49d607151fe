//! Logger initialisation for the qdash daemon.
//!
//! ```rust,no_run
//! use qdash_observe::{LoggerConfig, logger_init};
//!
//! let cfg = LoggerConfig::default().with_level("debug");
//! logger_init(&cfg).expect("logger");
//! ```

mod logger;
pub use logger::*;
