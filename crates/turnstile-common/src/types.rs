//! Core types shared across the Turnstile gate.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::GateError;

/// Raw gate settings as they appear in the configuration file.
///
/// Every field is optional here; [`GateConfig`] is the resolved form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TurnstileSettings {
    /// Cloudflare Turnstile secret key (required)
    pub turnstile_secret_key: Option<String>,

    /// Override for the siteverify endpoint
    pub turnstile_verify_url: Option<String>,

    /// Where to find the token: `header` or `form`
    pub token_location: Option<String>,

    /// Header or form field holding the token
    pub token_name: Option<String>,

    /// Where to find the client IP: `pdk`/`platform` or `header`
    pub remote_ip_location: Option<String>,

    /// Header holding the client IP when location is `header`
    pub remote_ip_name: Option<String>,

    /// Siteverify timeout in milliseconds (non-positive means default)
    pub request_timeout_ms: Option<i64>,

    /// Attach verification headers to allowed requests
    pub forward_verification_headers: Option<bool>,
}

/// Where the challenge token is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenLocation {
    /// Named request header
    #[default]
    Header,
    /// Named field of a form-encoded body
    Form,
}

impl FromStr for TokenLocation {
    type Err = String;

    /// Case-insensitive; anything but `header`/`form` is rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" => Ok(Self::Header),
            "form" => Ok(Self::Form),
            _ => Err(format!("invalid token_location '{}', use 'header' or 'form'", s)),
        }
    }
}

impl fmt::Display for TokenLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Form => f.write_str("form"),
        }
    }
}

/// Where the client IP is read from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IpLocation {
    /// Ask the host (forwarded IP, then connection IP)
    #[default]
    Platform,
    /// Named request header
    Header,
    /// Unknown value; the gate proceeds without an IP
    Unrecognized(String),
}

impl From<&str> for IpLocation {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdk" | "platform" => Self::Platform,
            "header" => Self::Header,
            _ => Self::Unrecognized(s.to_string()),
        }
    }
}

/// Siteverify secret key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw key. Do not log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Fully resolved gate configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub secret_key: SecretKey,
    pub verify_url: String,
    pub token_location: TokenLocation,
    pub token_name: String,
    pub ip_location: IpLocation,
    pub ip_name: String,
    pub timeout: Duration,
    pub forward_verification_headers: bool,
}

/// Form body sent to siteverify
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub secret: String,

    #[serde(rename = "response")]
    pub token: String,

    #[serde(rename = "remoteip", default, skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
}

impl VerificationRequest {
    /// Build a request; an empty IP is treated as unknown
    pub fn new(secret: &SecretKey, token: impl Into<String>, remote_ip: Option<String>) -> Self {
        Self {
            secret: secret.expose_secret().to_string(),
            token: token.into(),
            remote_ip: remote_ip.filter(|ip| !ip.is_empty()),
        }
    }

    /// Encode as `application/x-www-form-urlencoded`
    pub fn to_form_body(&self) -> Result<String, GateError> {
        serde_urlencoded::to_string(self).map_err(|e| GateError::RequestBuild(e.to_string()))
    }

    /// Decode a form body produced by [`Self::to_form_body`]
    pub fn from_form_body(body: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(body)
    }
}

impl fmt::Debug for VerificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationRequest")
            .field("secret", &"[REDACTED]")
            .field("token_len", &self.token.len())
            .field("remote_ip", &self.remote_ip)
            .finish()
    }
}

/// Parsed siteverify response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VerificationResult {
    /// The only field the decision depends on
    #[serde(default)]
    pub success: bool,

    /// ISO timestamp of the challenge load
    #[serde(default)]
    pub challenge_ts: Option<String>,

    /// Hostname of the site the challenge was solved on
    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(rename = "error-codes", default, deserialize_with = "null_as_empty")]
    pub error_codes: Vec<String>,

    /// Widget action identifier
    #[serde(default)]
    pub action: Option<String>,

    /// Customer data passed to the widget
    #[serde(default)]
    pub cdata: Option<String>,
}

impl VerificationResult {
    /// Challenge load time, if present and well-formed
    pub fn challenge_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.challenge_ts
            .as_deref()
            .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&chrono::Utc))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of gating one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through unmodified
    Allow,
    /// Terminate the request with this status and body
    Reject { status: u16, body: &'static str },
}

impl GateDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Status code of a rejection, `None` for `Allow`
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Allow => None,
            Self::Reject { status, .. } => Some(*status),
        }
    }
}

impl From<&GateError> for GateDecision {
    fn from(err: &GateError) -> Self {
        Self::Reject {
            status: err.status_code(),
            body: err.public_message(),
        }
    }
}
