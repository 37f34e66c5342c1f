//! Error taxonomy for the Turnstile gate.
//!
//! The `Display` text of every variant is operator-facing and goes to the log.
//! Callers only ever see [`GateError::public_message`].

use thiserror::Error;

use crate::constants::messages;

/// Why the verification service could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamFailure {
    /// TCP/TLS connection could not be established or was reset
    #[error("connection failed: {0}")]
    Connect(String),

    /// The call did not complete within the configured timeout
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// The service answered with a non-200 status
    #[error("status {status}, body: {body}")]
    Status { status: u16, body: String },
}

/// Errors that terminate a gated request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Gate configuration is unusable (missing secret, bad token location)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token header could not be read
    #[error("Token header '{name}' unreadable: {reason}")]
    TokenHeader { name: String, reason: String },

    /// Request body could not be parsed as a form
    #[error("Form data unreadable: {0}")]
    FormRead(String),

    /// Token absent or empty at the configured location
    #[error("Token missing: {0}")]
    TokenMissing(String),

    /// Outbound siteverify request could not be built
    #[error("Failed to build siteverify request: {0}")]
    RequestBuild(String),

    /// Siteverify unreachable, timed out, or answered non-200
    #[error("Siteverify unavailable: {0}")]
    UpstreamUnavailable(UpstreamFailure),

    /// Siteverify response body could not be read
    #[error("Failed to read siteverify response: {0}")]
    ResponseRead(String),

    /// Siteverify response body is not the expected JSON
    #[error("Failed to parse siteverify response: {reason} - body: {body}")]
    ResponseParse { reason: String, body: String },

    /// Siteverify answered `success = false`
    #[error("Verification denied, error codes: [{}]", .0.join(", "))]
    VerificationDenied(Vec<String>),
}

impl GateError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_) => 500,
            Self::TokenHeader { .. } => 400,
            Self::FormRead(_) => 400,
            Self::TokenMissing(_) => 400,
            Self::RequestBuild(_) => 500,
            Self::UpstreamUnavailable(_) => 502,
            Self::ResponseRead(_) => 500,
            Self::ResponseParse { .. } => 500,
            Self::VerificationDenied(_) => 403,
        }
    }

    /// Short, non-diagnostic body returned to the caller
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Config(_) => messages::CONFIG_ERROR,
            Self::TokenHeader { .. } => messages::TOKEN_INVALID,
            Self::FormRead(_) => messages::FORM_UNREADABLE,
            Self::TokenMissing(_) => messages::TOKEN_MISSING,
            Self::RequestBuild(_) => messages::REQUEST_CREATION,
            Self::UpstreamUnavailable(UpstreamFailure::Status { .. }) => messages::API_ERROR,
            Self::UpstreamUnavailable(_) => messages::CONNECTION_ERROR,
            Self::ResponseRead(_) => messages::READ_ERROR,
            Self::ResponseParse { .. } => messages::PARSE_ERROR,
            Self::VerificationDenied(_) => messages::VERIFICATION_FAILED,
        }
    }

    /// Returns true if the caller supplied a bad or missing token
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::TokenHeader { .. } | Self::FormRead(_) | Self::TokenMissing(_)
        )
    }

    /// Returns true if the siteverify call hit its deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(UpstreamFailure::Timeout(_)))
    }
}
