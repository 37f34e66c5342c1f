//! Application state and shared resources.

use anyhow::{Context, Result};
use std::net::IpAddr;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::gate::{GateController, SiteVerifyClient, resolve};

/// Shared application state.
///
/// Everything here is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Turnstile gate
    pub gate: GateController,

    /// Peers whose forwarding headers are believed
    pub trusted_proxies: Arc<[IpAddr]>,

    /// Largest request body buffered for form tokens
    pub max_body_bytes: usize,
}

impl AppState {
    /// Build state from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("turnstile-gate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create siteverify HTTP client")?;

        // Bad gate settings are not fatal: every request is answered with 500
        match resolve(&config.turnstile) {
            Ok(gate_config) => tracing::info!(
                verify_url = %gate_config.verify_url,
                token_location = %gate_config.token_location,
                token_name = %gate_config.token_name,
                timeout_ms = gate_config.timeout.as_millis() as u64,
                "Turnstile gate configured"
            ),
            Err(e) => tracing::error!(
                error = %e,
                "Turnstile gate misconfigured, all requests will be rejected"
            ),
        }

        Ok(Self {
            gate: GateController::new(config.turnstile.clone(), SiteVerifyClient::new(http)),
            trusted_proxies: config.trusted_proxies.clone().into(),
            max_body_bytes: config.max_body_bytes,
        })
    }
}
