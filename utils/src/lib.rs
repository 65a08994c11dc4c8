//! Shared utilities for votebox.

pub mod logging;

pub use logging::{init_logging, LogFormat, UnknownLogFormat};
