//! # mdsview Utilities
//!
//! Logging setup and command-line parsing helpers shared by the mdsview
//! binaries.

pub mod logging;
pub mod parse;

pub use logging::{
    init_logging, init_logging_for_tui, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard,
};
pub use parse::{parse_register, parse_segment, parse_u64, ParseError};
pub use tracing::{debug, error, info, trace, warn};
