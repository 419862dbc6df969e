//! HTTP adapters for the IconeSign backend and the signing service
//!
//! - `IconeSignClient`: auth, batch workflow, progress, TTN, certificates
//! - `SigningClient`: direct sign, e-fact save, validation, packaging
//! - `RetryPolicy`: exponential backoff for idempotent requests

pub mod client;
pub mod errors;
pub mod retry;
pub mod signing;

pub use client::{IconeSignClient, IconeSignClientConfig};
pub use retry::RetryPolicy;
pub use signing::SigningClient;
