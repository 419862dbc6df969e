//! Infrastructure layer
//!
//! Adapters behind the domain ports plus process-wide concerns:
//! - Configuration loading (figment)
//! - Logging (tracing)
//! - HTTP clients (reqwest)
//! - Local storage (session file, activity journal)

pub mod config;
pub mod http;
pub mod logging;
pub mod storage;
