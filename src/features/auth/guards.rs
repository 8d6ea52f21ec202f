//! Role-based authorization guards.
//!
//! Both guards read the [`SessionContext`] placed in the request extensions by
//! the session middleware.
//!
//! - `RequireUser`: any logged-in visitor
//! - `RequireAdmin`: back-office staff (`admin` or `super_admin`)

use crate::core::error::AppError;
use crate::features::auth::model::SessionContext;
use axum::{extract::FromRequestParts, http::request::Parts};

fn session(parts: &Parts) -> Result<&SessionContext, AppError> {
    parts
        .extensions
        .get::<SessionContext>()
        .ok_or_else(|| AppError::Internal("Session middleware not installed".to_string()))
}

/// Guard for endpoints that need a logged-in user.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireUser(session): RequireUser) { ... }
/// ```
pub struct RequireUser(pub SessionContext);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session(parts)?;

        if !session.is_authenticated() {
            return Err(AppError::Unauthorized("Please log in first".to_string()));
        }

        Ok(RequireUser(session.clone()))
    }
}

/// Guard for the admin console.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(session): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub SessionContext);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session(parts)?;

        if !session.is_authenticated() {
            return Err(AppError::Unauthorized("User not authenticated".to_string()));
        }

        if !session.has_admin_access() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(RequireAdmin(session.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::admin_session;
    use axum::http::Request;
    use uuid::Uuid;

    fn parts_with(session: Option<SessionContext>) -> Parts {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        parts
    }

    #[tokio::test]
    async fn test_require_admin_accepts_admin() {
        let mut parts = parts_with(Some(admin_session()));
        assert!(RequireAdmin::from_request_parts(&mut parts, &()).await.is_ok());
    }

    #[tokio::test]
    async fn test_require_admin_rejects_anonymous_and_citizens() {
        let mut parts = parts_with(Some(SessionContext::anonymous(Uuid::new_v4())));
        let err = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let mut citizen = admin_session();
        if let Some(user) = citizen.user.as_mut() {
            user.role = "user".to_string();
        }
        let mut parts = parts_with(Some(citizen));
        let err = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_require_user_without_middleware_is_internal_error() {
        let mut parts = parts_with(None);
        let err = RequireUser::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
