//! Configuration management for the gate service.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;

use turnstile_common::TurnstileSettings;
use turnstile_common::constants::{DEFAULT_LISTEN_ADDR, DEFAULT_MAX_BODY_BYTES};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Peers whose forwarding headers are believed
    #[serde(default = "default_trusted_proxies")]
    pub trusted_proxies: Vec<IpAddr>,

    /// Largest request body buffered for form tokens
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Turnstile gate settings
    #[serde(default)]
    pub turnstile: TurnstileSettings,
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_trusted_proxies() -> Vec<IpAddr> {
    vec![IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)]
}
fn default_max_body_bytes() -> usize { DEFAULT_MAX_BODY_BYTES }

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref secret) = args.secret_key {
            config.turnstile.turnstile_secret_key = Some(secret.clone());
        }

        Ok(config)
    }

    fn from_file(config_path: &str) -> Result<Self> {
        if !Path::new(config_path).exists() {
            // Use defaults if config file doesn't exist
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path))
            .build()
            .context("Failed to load config file")?;

        settings
            .try_deserialize()
            .context("Failed to parse config")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            trusted_proxies: default_trusted_proxies(),
            max_body_bytes: default_max_body_bytes(),
            turnstile: TurnstileSettings::default(),
        }
    }
}
