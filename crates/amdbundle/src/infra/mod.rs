//! Infrastructure adapters for configuration, file IO, and logging.

pub mod config;
pub mod fs;
pub mod logging;
