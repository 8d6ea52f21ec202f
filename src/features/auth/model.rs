use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::modules::backend::{SharedCredentials, UserProfile};
use crate::shared::constants::{ROLE_ADMIN, ROLE_SUPER_ADMIN};

/// Snapshot of the visitor's portal session, attached to each request by
/// the session middleware.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: Uuid,
    /// Backend cookies and CSRF token; cookies set during the request land here too
    pub credentials: SharedCredentials,
    /// Cached profile of the logged-in user
    pub user: Option<UserProfile>,
    kept: Arc<AtomicBool>,
}

impl SessionContext {
    pub fn new(
        session_id: Uuid,
        credentials: SharedCredentials,
        user: Option<UserProfile>,
    ) -> Self {
        Self {
            session_id,
            credentials,
            user,
            kept: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn anonymous(session_id: Uuid) -> Self {
        Self::new(session_id, SharedCredentials::default(), None)
    }

    /// Ask for the session to be stored at the end of the request.
    ///
    /// First-time visitors only get a stored session (and a cookie) once
    /// something keyed by their session id exists.
    pub fn keep(&self) {
        self.kept.store(true, Ordering::Relaxed);
    }

    pub fn is_kept(&self) -> bool {
        self.kept.load(Ordering::Relaxed)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Check if the logged-in user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.user.as_ref().is_some_and(|u| u.role == role)
    }

    /// Admins and super admins may use the back office
    pub fn has_admin_access(&self) -> bool {
        self.has_role(ROLE_ADMIN) || self.has_role(ROLE_SUPER_ADMIN)
    }
}
