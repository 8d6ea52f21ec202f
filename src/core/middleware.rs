use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use futures::future::BoxFuture;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

use crate::features::auth::SessionStore;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

/// CORS for the browser front end. Session cookies need credentials, which
/// browsers reject together with a wildcard origin.
pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    // If origins list contains "*", allow any origin (without cookies)
    if allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::PATCH,
                axum::http::Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
    }
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(Request, Next) -> BoxFuture<'static, Result<Response, Response>> + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let authorized = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok())
                .and_then(|value| value.strip_prefix("Basic "))
                .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
                .and_then(|decoded| String::from_utf8(decoded).ok())
                .is_some_and(|creds| creds == *credentials);

            if authorized {
                return Ok(next.run(req).await);
            }

            let response = (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
                Body::from("Unauthorized"),
            )
                .into_response();

            Err(response)
        })
    }
}

/// Value of a single cookie from the request's `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Attach the visitor's portal session to every request.
///
/// Unknown or expired session ids are replaced by a fresh, unsaved session.
/// It is stored (and the response carries its cookie) only when the request
/// logged in or kept the session for wizard or assistant state. Backend
/// cookies received during the request are written back to stored sessions.
pub async fn session_middleware(
    State(sessions): State<Arc<SessionStore>>,
    mut req: Request,
    next: Next,
) -> Response {
    let existing = cookie_value(req.headers(), sessions.cookie_name())
        .and_then(|raw| Uuid::parse_str(&raw).ok());

    let restored = match existing {
        Some(id) => sessions.read(id).await,
        None => None,
    };

    let (context, is_new) = match restored {
        Some(context) => (context, false),
        None => (sessions.init(), true),
    };

    let session_id = context.session_id;
    req.extensions_mut().insert(context.clone());

    let mut response = next.run(req).await;

    let received = context.credentials.take_received();
    let stored = !is_new || context.is_kept() || sessions.contains(session_id).await;
    if stored && (context.is_kept() || !received.is_empty()) {
        sessions.persist(session_id, received).await;
    }

    if is_new && stored {
        match HeaderValue::from_str(&sessions.cookie_for(session_id)) {
            Ok(cookie) => {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            Err(e) => tracing::error!("Failed to build session cookie: {}", e),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SessionConfig;
    use crate::features::auth::model::SessionContext;
    use axum::{http::HeaderName, routing::get, Router};
    use axum_test::TestServer;

    async fn whoami(context: SessionContext) -> String {
        context.session_id.to_string()
    }

    async fn start_wizard(context: SessionContext) -> String {
        context.keep();
        context.session_id.to_string()
    }

    async fn rotate_csrf(context: SessionContext) -> String {
        context
            .credentials
            .absorb(vec![("ics_csrf_token".to_string(), "rotated".to_string())]);
        context.session_id.to_string()
    }

    fn session_app(store: Arc<SessionStore>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route("/wizard", get(start_wizard))
            .route("/rotate", get(rotate_csrf))
            .layer(axum::middleware::from_fn_with_state(
                store,
                session_middleware,
            ))
    }

    #[test]
    fn test_cookie_value_across_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; portal_sid=abc123; lang=en"),
        );
        assert_eq!(cookie_value(&headers, "portal_sid").as_deref(), Some("abc123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    fn session_cookie(session_id: Uuid) -> HeaderValue {
        HeaderValue::from_str(&format!("portal_sid={}", session_id)).unwrap()
    }

    #[tokio::test]
    async fn test_browsing_visitors_leave_no_sessions_behind() {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let server = TestServer::new(session_app(store.clone())).unwrap();

        for _ in 0..50 {
            let response = server.get("/whoami").await;
            response.assert_status_ok();
            assert!(response.headers().get(header::SET_COOKIE).is_none());

            let id = Uuid::parse_str(&response.text()).unwrap();
            assert!(!store.contains(id).await);
        }
    }

    #[tokio::test]
    async fn test_new_visitor_gets_session_cookie() {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let server = TestServer::new(session_app(store.clone())).unwrap();

        let response = server.get("/wizard").await;
        response.assert_status_ok();

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(set_cookie.starts_with("portal_sid="));
        assert!(set_cookie.contains("HttpOnly"));

        let id = Uuid::parse_str(&response.text()).unwrap();
        assert!(store.read(id).await.is_some());
    }

    #[tokio::test]
    async fn test_known_session_is_reused_without_new_cookie() {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let existing = store.init().session_id;
        store.persist(existing, Vec::new()).await;
        let server = TestServer::new(session_app(store)).unwrap();

        let response = server
            .get("/wizard")
            .add_header(HeaderName::from_static("cookie"), session_cookie(existing))
            .await;

        assert_eq!(response.text(), existing.to_string());
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_unknown_session_id_is_replaced() {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let server = TestServer::new(session_app(store)).unwrap();
        let stale = Uuid::new_v4();

        let response = server
            .get("/wizard")
            .add_header(HeaderName::from_static("cookie"), session_cookie(stale))
            .await;

        assert_ne!(response.text(), stale.to_string());
        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_backend_cookies_are_written_back_to_the_session() {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let existing = store.init().session_id;
        store.persist(existing, Vec::new()).await;
        let server = TestServer::new(session_app(store.clone())).unwrap();

        let response = server
            .get("/rotate")
            .add_header(HeaderName::from_static("cookie"), session_cookie(existing))
            .await;
        response.assert_status_ok();
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let restored = store.read(existing).await.unwrap();
        assert_eq!(restored.credentials.snapshot().csrf_token(), Some("rotated"));
    }

    #[tokio::test]
    async fn test_backend_cookies_alone_do_not_store_a_new_visitor() {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let server = TestServer::new(session_app(store.clone())).unwrap();

        let response = server.get("/rotate").await;
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let id = Uuid::parse_str(&response.text()).unwrap();
        assert!(!store.contains(id).await);
    }
}
