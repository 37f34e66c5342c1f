//! Forward-auth endpoint (called by Nginx `auth_request`, Traefik
//! `forwardAuth`, Envoy `ext_authz` or HAProxy).
//!
//! Returns:
//! - 200: Token verified, the proxy continues to the backend
//! - 400: Token missing or unreadable
//! - 403: Siteverify rejected the token
//! - 500/502: Gate misconfigured or siteverify unusable

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    response::Response,
};

use crate::host::AxumContext;
use crate::state::AppState;

/// Gate one request
pub async fn gate_request(State(state): State<AppState>, request: Request) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let (parts, body) = request.into_parts();
    // Only form tokens need the body; an oversized one just makes the form unreadable
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::debug!(error = %e, "Request body not buffered");
            None
        }
    };

    tracing::debug!(method = %parts.method, uri = %parts.uri, peer = ?peer, "Gating request");

    let mut ctx = AxumContext::new(&parts.headers, body.as_ref(), peer, &state.trusted_proxies);
    let decision = state.gate.access(&mut ctx).await;
    ctx.into_response(decision)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use turnstile_common::TurnstileSettings;
    use turnstile_common::constants::messages;

    use crate::gate::GateController;
    use crate::gate::testing::{self, DENIED_BODY, SUCCESS_BODY, SiteverifyServer};
    use crate::routes::create_router;
    use crate::state::AppState;

    fn state(settings: TurnstileSettings) -> AppState {
        AppState {
            gate: GateController::new(settings, testing::client()),
            trusted_proxies: Arc::from(Vec::new()),
            max_body_bytes: 1024,
        }
    }

    fn settings(url: &str) -> TurnstileSettings {
        TurnstileSettings {
            turnstile_secret_key: Some("secret".to_string()),
            turnstile_verify_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(state(TurnstileSettings::default()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn test_header_token_allowed() {
        let server = SiteverifyServer::start(StatusCode::OK, SUCCESS_BODY).await;
        let app = create_router(state(TurnstileSettings {
            forward_verification_headers: Some(true),
            ..settings(&server.url)
        }));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/orders")
                    .header("Cf-Turnstile-Response", "tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-turnstile-verified"], "true");
        assert_eq!(response.headers()["x-turnstile-hostname"], "example.com");
    }

    #[tokio::test]
    async fn test_form_token_allowed() {
        let server = SiteverifyServer::start(StatusCode::OK, SUCCESS_BODY).await;
        let app = create_router(state(TurnstileSettings {
            token_location: Some("form".to_string()),
            token_name: Some("cf-turnstile-response".to_string()),
            ..settings(&server.url)
        }));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("user=bob&cf-turnstile-response=tok-1"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-turnstile-verified").is_none());

        let received = server.received().await;
        let sent = turnstile_common::VerificationRequest::from_form_body(&received[0]).unwrap();
        assert_eq!(sent.token, "tok-1");
        assert_eq!(sent.remote_ip, None);
    }

    #[tokio::test]
    async fn test_oversized_form_body_rejected_400() {
        let app = create_router(state(TurnstileSettings {
            token_location: Some("form".to_string()),
            ..settings("http://127.0.0.1:1/siteverify")
        }));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(format!("Cf-Turnstile-Response={}", "a".repeat(4096))))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, messages::FORM_UNREADABLE);
    }

    #[tokio::test]
    async fn test_denied_and_misconfigured() {
        let server = SiteverifyServer::start(StatusCode::OK, DENIED_BODY).await;

        let denied = create_router(state(settings(&server.url)))
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("Cf-Turnstile-Response", "bad")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        let text = body_text(denied).await;
        assert_eq!(text, messages::VERIFICATION_FAILED);
        assert!(!text.contains("invalid-input-response"));

        let misconfigured = create_router(state(TurnstileSettings::default()))
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("Cf-Turnstile-Response", "tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(misconfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(misconfigured).await, messages::CONFIG_ERROR);
    }
}
