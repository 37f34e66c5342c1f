//! # Turnstile Common
//!
//! Shared types and defaults used by the Turnstile gate.
//!
//! ## Modules
//! - `types` - Data model (settings, resolved config, siteverify request/result, decisions)
//! - `error` - Gate error taxonomy and its HTTP status mapping
//! - `constants` - Default endpoint, header names, and timeouts

pub mod constants;
pub mod error;
pub mod types;

pub use error::{GateError, UpstreamFailure};
pub use types::*;
