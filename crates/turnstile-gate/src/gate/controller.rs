//! Gate controller: runs the pipeline and turns the outcome into a decision.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use turnstile_common::constants::headers;
use turnstile_common::{
    GateConfig, GateDecision, GateError, TurnstileSettings, VerificationRequest, VerificationResult,
};

use super::client_ip::resolve_client_ip;
use super::token::extract_token;
use super::{RequestContext, SiteVerifyClient, resolve};

/// Per-request Turnstile gate.
///
/// Holds immutable settings and a stateless client; evaluating the same
/// request twice against the same siteverify answer gives the same decision.
/// Clones share the settings.
#[derive(Clone)]
pub struct GateController {
    settings: Arc<TurnstileSettings>,
    verifier: SiteVerifyClient,
}

impl GateController {
    pub fn new(settings: TurnstileSettings, verifier: SiteVerifyClient) -> Self {
        Self {
            settings: Arc::new(settings),
            verifier,
        }
    }

    /// Decide without touching the request
    #[cfg(test)]
    pub async fn evaluate<C: RequestContext + ?Sized>(&self, ctx: &C) -> GateDecision {
        match self.run(ctx).await {
            Ok(_) => GateDecision::Allow,
            Err(err) => reject(&err),
        }
    }

    /// Decide and enforce: short-circuit on reject, annotate upstream on allow
    pub async fn access<C: RequestContext + ?Sized>(&self, ctx: &mut C) -> GateDecision {
        match self.run(&*ctx).await {
            Ok((config, result)) => {
                if config.forward_verification_headers {
                    ctx.set_upstream_header(headers::X_TURNSTILE_VERIFIED, "true");
                    if let Some(hostname) = result.hostname.as_deref() {
                        ctx.set_upstream_header(headers::X_TURNSTILE_HOSTNAME, hostname);
                    }
                }
                GateDecision::Allow
            }
            Err(err) => {
                let decision = reject(&err);
                if let GateDecision::Reject { status, body } = decision {
                    ctx.exit(status, body);
                }
                decision
            }
        }
    }

    async fn run<C: RequestContext + ?Sized>(
        &self,
        ctx: &C,
    ) -> Result<(GateConfig, VerificationResult), GateError> {
        let config = resolve(&self.settings)?;
        let token = extract_token(&config, ctx)?;
        let client_ip = resolve_client_ip(&config, ctx);

        debug!(
            client_ip = client_ip.as_deref().unwrap_or(""),
            token_location = %config.token_location,
            "Verifying Turnstile token"
        );

        let request = VerificationRequest::new(&config.secret_key, token, client_ip);
        let result = self.verifier.verify(&config, &request).await?;

        if !result.success {
            return Err(GateError::VerificationDenied(result.error_codes));
        }

        info!(
            hostname = result.hostname.as_deref().unwrap_or(""),
            action = result.action.as_deref().unwrap_or(""),
            challenge_age_secs = result
                .challenge_time()
                .map(|ts| (chrono::Utc::now() - ts).num_seconds()),
            "Turnstile verification successful"
        );

        Ok((config, result))
    }
}

/// Log operator detail, return the generic caller-facing decision
fn reject(err: &GateError) -> GateDecision {
    let decision = GateDecision::from(err);
    let status = err.status_code();

    match err {
        GateError::VerificationDenied(_) => {
            warn!(status, error = %err, "Turnstile verification failed")
        }
        _ if err.is_client_error() => warn!(status, error = %err, "Rejecting request"),
        _ => error!(status, error = %err, "Rejecting request"),
    }

    decision
}
