use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{LoginRequestDto, RegisterRequestDto, SessionUserDto};
use crate::features::auth::model::SessionContext;
use crate::features::auth::services::SessionStore;
use crate::modules::backend::{BackendClient, UserProfile};

/// Login, registration and logout against the backend, keeping the portal
/// session in step with the backend session.
pub struct AuthService {
    client: BackendClient,
    sessions: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(client: BackendClient, sessions: Arc<SessionStore>) -> Self {
        Self { client, sessions }
    }

    pub async fn login(
        &self,
        session: &SessionContext,
        dto: LoginRequestDto,
    ) -> Result<SessionUserDto> {
        let outcome = self
            .client
            .session(session.credentials.clone())
            .login(&dto)
            .await?;

        tracing::info!("User {} logged in", outcome.user.id);

        self.sessions
            .store_login(session.session_id, outcome.credentials, outcome.user.clone())
            .await;

        Ok(SessionUserDto::new(outcome.user))
    }

    pub async fn register(
        &self,
        session: &SessionContext,
        dto: RegisterRequestDto,
    ) -> Result<UserProfile> {
        let user = self
            .client
            .session(session.credentials.clone())
            .register(&dto)
            .await?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Log out of the backend and forget the session's credentials.
    ///
    /// The portal session is cleared even if the backend call fails.
    pub async fn logout(&self, session: &SessionContext) -> Result<()> {
        if !session.credentials.is_empty() {
            if let Err(e) = self
                .client
                .session(session.credentials.clone())
                .logout()
                .await
            {
                tracing::warn!("Backend logout failed: {}", e);
            }
        }

        self.sessions.clear(session.session_id).await;
        Ok(())
    }

    /// Current user, refreshed from the backend
    pub async fn current_user(&self, session: &SessionContext) -> Result<SessionUserDto> {
        if session.credentials.is_empty() {
            return Err(AppError::Unauthorized("Not logged in".to_string()));
        }

        match self
            .client
            .session(session.credentials.clone())
            .fetch_me()
            .await
        {
            Ok(user) => {
                self.sessions
                    .set_user(session.session_id, Some(user.clone()))
                    .await;
                Ok(SessionUserDto::new(user))
            }
            Err(AppError::Backend { status: 401, .. }) => {
                tracing::info!("Backend session expired for {}", session.session_id);
                self.sessions.clear(session.session_id).await;
                Err(AppError::Unauthorized("Session expired".to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SessionConfig;
    use crate::shared::test_helpers::{backend_client, spawn_mock_backend};
    use axum::{
        http::{header::SET_COOKIE, StatusCode},
        response::{AppendHeaders, IntoResponse},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;

    fn login_dto() -> LoginRequestDto {
        LoginRequestDto {
            email: "a@b.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_then_logout_round_trip() {
        let router = Router::new()
            .route(
                "/auth/login",
                post(|| async {
                    (
                        AppendHeaders([(SET_COOKIE, "ics_session=abc; Path=/")]),
                        Json(json!({
                            "success": true,
                            "csrfToken": "tok",
                            "user": {"id": 9, "email": "a@b.com", "role": "admin"}
                        })),
                    )
                        .into_response()
                }),
            )
            .route("/auth/logout", post(|| async { Json(json!({"success": true})) }));
        let client = backend_client(spawn_mock_backend(router).await);
        let sessions = Arc::new(SessionStore::new(SessionConfig::default()));
        let service = AuthService::new(client, sessions.clone());

        let session = sessions.init();
        let logged_in = service.login(&session, login_dto()).await.unwrap();
        assert!(logged_in.is_admin);

        let restored = sessions.read(session.session_id).await.unwrap();
        assert_eq!(restored.credentials.snapshot().csrf_token(), Some("tok"));
        assert!(restored.has_admin_access());

        service.logout(&restored).await.unwrap();
        let cleared = sessions.read(session.session_id).await.unwrap();
        assert!(cleared.user.is_none());
        assert!(cleared.credentials.is_empty());
    }

    #[tokio::test]
    async fn test_expired_backend_session_clears_portal_session() {
        let router = Router::new().route(
            "/auth/me",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"success": false, "error": {"message": "Not authenticated"}})),
                )
            }),
        );
        let client = backend_client(spawn_mock_backend(router).await);
        let sessions = Arc::new(SessionStore::new(SessionConfig::default()));
        let service = AuthService::new(client, sessions.clone());

        let session = sessions.init();
        let mut credentials = session.credentials.snapshot();
        credentials.csrf_token = Some("stale".to_string());
        sessions
            .store_login(
                session.session_id,
                credentials,
                crate::shared::test_helpers::create_admin_user(),
            )
            .await;
        let session = sessions.read(session.session_id).await.unwrap();

        let err = service.current_user(&session).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(sessions.read(session.session_id).await.unwrap().user.is_none());
    }

    #[tokio::test]
    async fn test_anonymous_me_is_unauthorized() {
        let client = backend_client(spawn_mock_backend(Router::new()).await);
        let sessions = Arc::new(SessionStore::new(SessionConfig::default()));
        let service = AuthService::new(client, sessions.clone());

        let session = sessions.init();
        let err = service.current_user(&session).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
