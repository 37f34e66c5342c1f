//! Host capability interface consumed by the gate.

use std::collections::HashMap;

use thiserror::Error;

/// Form fields by name, each with every value in body order
pub type FormValues = HashMap<String, Vec<String>>;

/// Failure reported by a host accessor
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("header '{0}' is not valid UTF-8")]
    InvalidHeader(String),

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("malformed form body: {0}")]
    MalformedForm(String),

    #[error("client address unavailable")]
    NoClientAddr,
}

/// Per-request accessors provided by the hosting gateway.
///
/// The gate only reads the request through this trait and only ends it
/// through [`RequestContext::exit`].
pub trait RequestContext {
    /// Value of a request header; `Ok(None)` when absent
    fn header(&self, name: &str) -> Result<Option<String>, ContextError>;

    /// Request body parsed as `application/x-www-form-urlencoded`
    fn form_values(&self) -> Result<FormValues, ContextError>;

    /// Client IP as computed by the gateway from trusted forwarding headers
    fn forwarded_ip(&self) -> Result<Option<String>, ContextError>;

    /// IP of the peer on the raw connection
    fn client_ip(&self) -> Result<Option<String>, ContextError>;

    /// Short-circuit the request with a status and body
    fn exit(&mut self, status: u16, body: &'static str);

    /// Add a header to the request forwarded upstream
    fn set_upstream_header(&mut self, _name: &str, _value: &str) {}
}
