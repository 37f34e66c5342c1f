//! axum implementation of the gate's [`RequestContext`].
//!
//! The fronting proxy forwards the original request (headers, and the body
//! when form tokens are used); the answer tells it whether to continue.

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Bytes,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use turnstile_common::GateDecision;
use turnstile_common::constants::headers::{X_FORWARDED_FOR, X_REAL_IP};

use crate::gate::{ContextError, FormValues, RequestContext};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// One gated request as seen through axum
pub struct AxumContext<'a> {
    headers: &'a HeaderMap,
    /// `None` when the body could not be buffered
    body: Option<&'a Bytes>,
    peer: Option<SocketAddr>,
    trusted_proxies: &'a [IpAddr],
    exit: Option<(u16, &'static str)>,
    upstream_headers: Vec<(HeaderName, HeaderValue)>,
}

impl<'a> AxumContext<'a> {
    pub fn new(
        headers: &'a HeaderMap,
        body: Option<&'a Bytes>,
        peer: Option<SocketAddr>,
        trusted_proxies: &'a [IpAddr],
    ) -> Self {
        Self {
            headers,
            body,
            peer,
            trusted_proxies,
            exit: None,
            upstream_headers: Vec::new(),
        }
    }

    fn is_trusted(&self, ip: &IpAddr) -> bool {
        self.trusted_proxies.contains(ip)
    }

    /// Turn the enforced decision into the forward-auth answer
    pub fn into_response(self, decision: GateDecision) -> Response {
        match (decision, self.exit) {
            (GateDecision::Allow, _) => {
                let mut response = StatusCode::OK.into_response();
                response.headers_mut().extend(self.upstream_headers);
                response
            }
            (_, Some((status, body))) | (GateDecision::Reject { status, body }, None) => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let content_type = [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];
                (status, content_type, body).into_response()
            }
        }
    }
}

impl RequestContext for AxumContext<'_> {
    fn header(&self, name: &str) -> Result<Option<String>, ContextError> {
        match self.headers.get(name) {
            Some(value) => value
                .to_str()
                .map(|v| Some(v.to_string()))
                .map_err(|_| ContextError::InvalidHeader(name.to_string())),
            None => Ok(None),
        }
    }

    fn form_values(&self) -> Result<FormValues, ContextError> {
        let content_type = self
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let mime = content_type.split(';').next().unwrap_or("").trim();
        if !mime.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
            return Err(ContextError::UnsupportedContentType(content_type.to_string()));
        }

        let body = self
            .body
            .ok_or_else(|| ContextError::MalformedForm("body could not be read".to_string()))?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| ContextError::MalformedForm(e.to_string()))?;

        let mut form = FormValues::new();
        for (key, value) in pairs {
            form.entry(key).or_default().push(value);
        }
        Ok(form)
    }

    /// Real client address when the peer is a trusted proxy.
    ///
    /// `X-Real-IP` wins; otherwise the rightmost untrusted hop of
    /// `X-Forwarded-For`.
    fn forwarded_ip(&self) -> Result<Option<String>, ContextError> {
        let Some(peer) = self.peer else {
            return Ok(None);
        };
        if !self.is_trusted(&peer.ip()) {
            return Ok(None);
        }

        if let Some(real_ip) = self.header(X_REAL_IP)? {
            let real_ip = real_ip.trim();
            if !real_ip.is_empty() {
                return Ok(Some(real_ip.to_string()));
            }
        }

        let Some(chain) = self.header(X_FORWARDED_FOR)? else {
            return Ok(None);
        };
        let mut leftmost = None;
        for hop in chain.rsplit(',').map(str::trim).filter(|h| !h.is_empty()) {
            match hop.parse::<IpAddr>() {
                Ok(ip) if self.is_trusted(&ip) => leftmost = Some(hop),
                _ => return Ok(Some(hop.to_string())),
            }
        }
        Ok(leftmost.map(str::to_string))
    }

    fn client_ip(&self) -> Result<Option<String>, ContextError> {
        self.peer
            .map(|addr| Some(addr.ip().to_string()))
            .ok_or(ContextError::NoClientAddr)
    }

    fn exit(&mut self, status: u16, body: &'static str) {
        self.exit = Some((status, body));
    }

    fn set_upstream_header(&mut self, name: &str, value: &str) {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => self.upstream_headers.push((name, value)),
            _ => tracing::warn!(header = %name, "Skipping invalid upstream header"),
        }
    }
}
