//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty formatting on stderr
//! - Optional rolling file output
//! - Secret scrubbing on every writer

pub mod logger;
pub mod scrubber;

pub use logger::{LogFormat, LoggerImpl, RotationPolicy};
pub use scrubber::{ScrubbingMakeWriter, SecretScrubber};
