//! Logging utilities.
//!
//! The library itself only talks to the `log` facade. `init_logging` is a
//! convenience for binaries and tools that want an `env_logger` backend.

mod init;

pub use init::{init_logging, LoggingConfig};
