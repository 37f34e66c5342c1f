//! Test doubles: an in-memory request context and a local siteverify server.

use std::time::Duration;

use axum::http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{ContextError, FormValues, RequestContext, SiteVerifyClient};

/// Siteverify client that ignores proxy environment variables
pub fn client() -> SiteVerifyClient {
    SiteVerifyClient::new(reqwest::Client::builder().no_proxy().build().unwrap())
}

/// Recording [`RequestContext`] backed by plain fields
#[derive(Debug, Default)]
pub struct MockContext {
    headers: Vec<(String, String)>,
    form: Option<FormValues>,
    forwarded_ip: Option<String>,
    client_ip: Option<String>,
    pub exited: Option<(u16, &'static str)>,
    pub upstream_headers: Vec<(String, String)>,
}

impl MockContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a form field; the body counts as a readable form from now on
    pub fn with_form_field(mut self, name: &str, values: &[&str]) -> Self {
        self.form
            .get_or_insert_with(FormValues::new)
            .insert(name.to_string(), values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_forwarded_ip(mut self, ip: &str) -> Self {
        self.forwarded_ip = Some(ip.to_string());
        self
    }

    pub fn with_client_ip(mut self, ip: &str) -> Self {
        self.client_ip = Some(ip.to_string());
        self
    }
}

impl RequestContext for MockContext {
    fn header(&self, name: &str) -> Result<Option<String>, ContextError> {
        Ok(self
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone()))
    }

    fn form_values(&self) -> Result<FormValues, ContextError> {
        self.form
            .clone()
            .ok_or_else(|| ContextError::UnsupportedContentType("none".to_string()))
    }

    fn forwarded_ip(&self) -> Result<Option<String>, ContextError> {
        Ok(self.forwarded_ip.clone())
    }

    fn client_ip(&self) -> Result<Option<String>, ContextError> {
        self.client_ip.clone().map(Some).ok_or(ContextError::NoClientAddr)
    }

    fn exit(&mut self, status: u16, body: &'static str) {
        self.exited = Some((status, body));
    }

    fn set_upstream_header(&mut self, name: &str, value: &str) {
        self.upstream_headers.push((name.to_string(), value.to_string()));
    }
}

/// Local siteverify endpoint for a single test
pub struct SiteverifyServer {
    pub url: String,
    server: MockServer,
}

impl SiteverifyServer {
    pub async fn start(status: StatusCode, body: &'static str) -> Self {
        Self::start_delayed(status, body, Duration::ZERO).await
    }

    pub async fn start_delayed(status: StatusCode, body: &'static str, delay: Duration) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/siteverify"))
            .respond_with(
                ResponseTemplate::new(status.as_u16())
                    .set_body_string(body)
                    .set_delay(delay),
            )
            .mount(&server)
            .await;

        Self {
            url: format!("{}/siteverify", server.uri()),
            server,
        }
    }

    /// Form bodies received so far
    pub async fn received(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| String::from_utf8_lossy(&request.body).into_owned())
            .collect()
    }
}

/// URL on a port nothing listens on
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/siteverify", addr)
}

/// URL of a server that announces a 100 byte body, sends less, then hangs up
pub async fn truncated_body_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\n{\"succ")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{}/siteverify", addr)
}

/// Drain one request (head plus `content-length` body) so closing does not reset
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let body_len = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + body_len {
                return;
            }
        }
    }
}

pub const SUCCESS_BODY: &str = concat!(
    r#"{"success":true,"challenge_ts":"2024-05-01T12:00:00.000Z","#,
    r#""hostname":"example.com","error-codes":[]}"#,
);
pub const DENIED_BODY: &str = r#"{"success":false,"error-codes":["invalid-input-response"]}"#;
