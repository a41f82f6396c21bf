//! Process-wide logging setup.
//!
//! Every crate logs through `tracing`; only binaries and benches call
//! [`init`].

pub mod tracing;

pub use self::tracing::{LOG_FORMAT_ENV, LogFormat, UnknownLogFormat, init, init_with};
