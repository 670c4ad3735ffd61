//! Logging setup.
//!
//! The engine itself only talks to the `log` facade. Binaries call
//! [`init_logging`] once at startup to install `env_logger`.

mod init;

pub use init::{init_logging, LoggingConfig};
