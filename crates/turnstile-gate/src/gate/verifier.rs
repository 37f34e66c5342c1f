//! Cloudflare siteverify client.

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use turnstile_common::{
    GateConfig, GateError, UpstreamFailure, VerificationRequest, VerificationResult,
};

/// Response bodies are cut to this many bytes before logging
const MAX_LOGGED_BODY: usize = 512;

/// Siteverify client.
///
/// Holds only a connection pool; every call is a single, independent attempt
/// bounded by the configured timeout. No retries.
#[derive(Clone)]
pub struct SiteVerifyClient {
    http: reqwest::Client,
}

impl SiteVerifyClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// POST the form-encoded request and parse the verdict
    pub async fn verify(
        &self,
        config: &GateConfig,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, GateError> {
        let timeout_ms = u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX);
        let url = reqwest::Url::parse(&config.verify_url)
            .map_err(|e| GateError::RequestBuild(format!("invalid verify URL: {}", e)))?;
        let body = request.to_form_body()?;

        let response = self
            .http
            .post(url)
            .timeout(config.timeout)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| classify_send_error(&e, timeout_ms))?;

        let status = response.status();
        // Consumes the response; the connection goes back to the pool or is dropped
        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                GateError::UpstreamUnavailable(UpstreamFailure::Timeout(timeout_ms))
            } else {
                GateError::ResponseRead(e.to_string())
            }
        })?;

        if status != StatusCode::OK {
            return Err(GateError::UpstreamUnavailable(UpstreamFailure::Status {
                status: status.as_u16(),
                body: loggable_body(&bytes),
            }));
        }

        serde_json::from_slice::<VerificationResult>(&bytes).map_err(|e| GateError::ResponseParse {
            reason: e.to_string(),
            body: loggable_body(&bytes),
        })
    }
}

fn classify_send_error(err: &reqwest::Error, timeout_ms: u64) -> GateError {
    if err.is_builder() {
        GateError::RequestBuild(err.to_string())
    } else if err.is_timeout() {
        GateError::UpstreamUnavailable(UpstreamFailure::Timeout(timeout_ms))
    } else {
        GateError::UpstreamUnavailable(UpstreamFailure::Connect(err.to_string()))
    }
}

fn loggable_body(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.char_indices().nth(MAX_LOGGED_BODY) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}
