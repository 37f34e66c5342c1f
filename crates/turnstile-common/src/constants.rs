//! Shared constants for the Turnstile gate.

/// Default Cloudflare siteverify endpoint
pub const DEFAULT_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Default timeout for the siteverify call (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Header carrying the Turnstile token by default
pub const DEFAULT_TOKEN_NAME: &str = "Cf-Turnstile-Response";

/// Header carrying the client IP when `remote_ip_location = "header"`
pub const DEFAULT_REMOTE_IP_NAME: &str = "X-Forwarded-For";

/// Default gate HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8899";

/// Default cap on buffered request bodies (64 KiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Siteverify form field names
pub mod form_fields {
    pub const SECRET: &str = "secret";
    pub const RESPONSE: &str = "response";
    pub const REMOTE_IP: &str = "remoteip";
}

/// HTTP header names
pub mod headers {
    /// Set on allowed requests when verification headers are forwarded
    pub const X_TURNSTILE_VERIFIED: &str = "X-Turnstile-Verified";

    /// Hostname the challenge was solved on
    pub const X_TURNSTILE_HOSTNAME: &str = "X-Turnstile-Hostname";

    /// Real client IP as set by a trusted proxy
    pub const X_REAL_IP: &str = "X-Real-IP";

    /// Forwarded-for chain as set by trusted proxies
    pub const X_FORWARDED_FOR: &str = "X-Forwarded-For";
}

/// Caller-facing response bodies. Deliberately generic.
pub mod messages {
    pub const CONFIG_ERROR: &str = "Plugin Configuration Error";
    pub const TOKEN_INVALID: &str = "Turnstile token missing or invalid";
    pub const FORM_UNREADABLE: &str = "Could not read form data";
    pub const TOKEN_MISSING: &str = "Turnstile token missing";
    pub const REQUEST_CREATION: &str = "Turnstile verification failed (request creation)";
    pub const CONNECTION_ERROR: &str = "Turnstile verification failed (connection error)";
    pub const READ_ERROR: &str = "Turnstile verification failed (read error)";
    pub const API_ERROR: &str = "Turnstile verification failed (API error)";
    pub const PARSE_ERROR: &str = "Turnstile verification failed (parse error)";
    pub const VERIFICATION_FAILED: &str = "Verification failed";
}
