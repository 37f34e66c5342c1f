//! Resolves raw settings into a [`GateConfig`].

use std::time::Duration;

use turnstile_common::constants::{
    DEFAULT_REMOTE_IP_NAME, DEFAULT_TIMEOUT_MS, DEFAULT_TOKEN_NAME, DEFAULT_VERIFY_URL,
};
use turnstile_common::{
    GateConfig, GateError, IpLocation, SecretKey, TokenLocation, TurnstileSettings,
};

/// Fill defaults and validate.
///
/// Fails on a missing or blank secret and on an unknown token location.
/// An unknown IP location is kept as [`IpLocation::Unrecognized`] and only
/// warned about when the IP is resolved.
pub fn resolve(settings: &TurnstileSettings) -> Result<GateConfig, GateError> {
    let secret = settings
        .turnstile_secret_key
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| GateError::Config("turnstile_secret_key is required".to_string()))?;

    let token_location = match non_empty(&settings.token_location) {
        Some(raw) => raw.parse::<TokenLocation>().map_err(GateError::Config)?,
        None => TokenLocation::default(),
    };

    let ip_location = non_empty(&settings.remote_ip_location)
        .map(IpLocation::from)
        .unwrap_or_default();

    let timeout_ms = settings
        .request_timeout_ms
        .and_then(|ms| u64::try_from(ms).ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_TIMEOUT_MS);

    Ok(GateConfig {
        secret_key: SecretKey::new(secret),
        verify_url: non_empty(&settings.turnstile_verify_url)
            .unwrap_or(DEFAULT_VERIFY_URL)
            .to_string(),
        token_location,
        token_name: non_empty(&settings.token_name)
            .unwrap_or(DEFAULT_TOKEN_NAME)
            .to_string(),
        ip_location,
        ip_name: non_empty(&settings.remote_ip_name)
            .unwrap_or(DEFAULT_REMOTE_IP_NAME)
            .to_string(),
        timeout: Duration::from_millis(timeout_ms),
        forward_verification_headers: settings.forward_verification_headers.unwrap_or(false),
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
