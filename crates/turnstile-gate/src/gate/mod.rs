//! Turnstile verification gate.
//!
//! Per-request pipeline, strictly linear:
//! resolver → token → client_ip → verifier → controller decision.
//! Nothing here holds state between requests.

mod client_ip;
mod context;
mod controller;
mod resolver;
mod token;
mod verifier;

pub use context::{ContextError, FormValues, RequestContext};
pub use controller::GateController;
pub use resolver::resolve;
pub use verifier::SiteVerifyClient;

#[cfg(test)]
pub(crate) mod testing;
