//! Best-effort client IP resolution. Never rejects a request.

use turnstile_common::{GateConfig, IpLocation};

use super::RequestContext;

/// Resolve the IP to send as `remoteip`; `None` when it cannot be determined
pub fn resolve_client_ip<C: RequestContext + ?Sized>(
    config: &GateConfig,
    ctx: &C,
) -> Option<String> {
    let ip = match &config.ip_location {
        IpLocation::Platform => from_platform(ctx),
        IpLocation::Header => from_header(ctx, &config.ip_name),
        IpLocation::Unrecognized(raw) => {
            tracing::warn!(
                remote_ip_location = %raw,
                "Invalid remote_ip_location, use 'pdk' or 'header'. Proceeding without remote IP"
            );
            None
        }
    };

    ip.filter(|ip| !ip.is_empty())
}

fn from_platform<C: RequestContext + ?Sized>(ctx: &C) -> Option<String> {
    match ctx.forwarded_ip() {
        Ok(Some(ip)) if !ip.is_empty() => return Some(ip),
        Ok(_) => {}
        Err(e) => tracing::debug!(error = %e, "Forwarded IP unavailable, using connection IP"),
    }

    match ctx.client_ip() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::warn!(error = %e, "Could not get client IP from platform");
            None
        }
    }
}

fn from_header<C: RequestContext + ?Sized>(ctx: &C, name: &str) -> Option<String> {
    match ctx.header(name) {
        // Forwarded-for chains list the original client first
        Ok(value) => value.map(|v| match v.split_once(',') {
            Some((first, _)) => first.trim().to_string(),
            None => v,
        }),
        Err(e) => {
            tracing::warn!(header = %name, error = %e, "Could not get client IP from header");
            None
        }
    }
}
