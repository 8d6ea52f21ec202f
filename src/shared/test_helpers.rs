#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
use axum::{extract::Request, http::HeaderMap, middleware::Next, Router};

#[cfg(test)]
use crate::features::auth::model::SessionContext;
#[cfg(test)]
use crate::modules::backend::{BackendClient, BackendCredentials, UserProfile};

/// Serve `router` on an ephemeral localhost port and return its base URL
#[cfg(test)]
pub async fn spawn_mock_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock backend");
    });
    format!("http://{}", addr)
}

#[cfg(test)]
pub fn backend_client(base_url: String) -> BackendClient {
    BackendClient::new(&crate::core::config::BackendConfig::new(
        base_url,
        std::time::Duration::from_secs(5),
        "portal-tests".to_string(),
    ))
    .expect("backend client")
}

/// Headers of every request a mock backend received
#[cfg(test)]
#[derive(Clone, Default)]
pub struct RecordedRequests(Arc<Mutex<Vec<HeaderMap>>>);

#[cfg(test)]
impl RecordedRequests {
    pub fn record(&self, headers: &HeaderMap) {
        self.0.lock().unwrap().push(headers.clone());
    }

    pub fn all(&self) -> Vec<HeaderMap> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

#[cfg(test)]
pub fn create_admin_user() -> UserProfile {
    UserProfile {
        id: 1,
        email: "admin@consulate.test".to_string(),
        first_name: Some("Desk".to_string()),
        last_name: Some("Officer".to_string()),
        gender: None,
        date_of_birth: None,
        nationality: None,
        passport_number: None,
        passport_expiry: None,
        phone: None,
        role: "admin".to_string(),
    }
}

#[cfg(test)]
pub fn admin_session() -> SessionContext {
    let mut credentials = BackendCredentials::default();
    credentials.csrf_token = Some("test-csrf".to_string());
    SessionContext::new(
        uuid::Uuid::new_v4(),
        credentials.into(),
        Some(create_admin_user()),
    )
}

/// Wrap a router so every request carries the given portal session
#[cfg(test)]
pub fn with_session(router: Router, session: SessionContext) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let session = session.clone();
            async move {
                request.extensions_mut().insert(session);
                next.run(request).await
            }
        },
    ))
}

/// Wrap a router so every request carries the same logged-in admin session
#[cfg(test)]
pub fn with_admin_session(router: Router) -> Router {
    with_session(router, admin_session())
}
