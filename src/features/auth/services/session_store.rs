use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::config::SessionConfig;
use crate::features::auth::model::SessionContext;
use crate::modules::backend::{BackendCredentials, SharedCredentials, UserProfile};

struct SessionState {
    credentials: BackendCredentials,
    user: Option<UserProfile>,
    last_seen: Instant,
}

impl SessionState {
    fn fresh() -> Self {
        Self {
            credentials: BackendCredentials::default(),
            user: None,
            last_seen: Instant::now(),
        }
    }

    fn context(&self, session_id: Uuid) -> SessionContext {
        SessionContext::new(
            session_id,
            SharedCredentials::new(self.credentials.clone()),
            self.user.clone(),
        )
    }
}

/// Server-side storage for per-visitor auth state (backend cookies, CSRF
/// token, cached user), keyed by the portal session cookie.
///
/// Lifecycle is explicit: [`init`](Self::init) issues an id without storing
/// anything, [`persist`](Self::persist) and [`store_login`](Self::store_login)
/// store it, [`read`](Self::read) restores it and [`clear`](Self::clear)
/// wipes the auth state on logout. Idle sessions expire after the configured TTL.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionState>>,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// `Set-Cookie` value for a newly issued session
    pub fn cookie_for(&self, session_id: Uuid) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.config.cookie_name,
            session_id,
            self.config.ttl.as_secs()
        );
        if self.config.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Session for a visitor without a valid cookie. Not stored yet.
    pub fn init(&self) -> SessionContext {
        SessionContext::anonymous(Uuid::new_v4())
    }

    /// Store the session if needed and apply cookies the backend set while
    /// serving the request
    pub async fn persist(&self, session_id: Uuid, received: Vec<(String, String)>) {
        let mut sessions = self.sessions.write().await;
        let state = sessions.entry(session_id).or_insert_with(|| {
            tracing::debug!("Portal session created: {}", session_id);
            SessionState::fresh()
        });
        state.credentials.merge_cookies(received);
        state.last_seen = Instant::now();
    }

    pub async fn contains(&self, session_id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&session_id)
    }

    /// Restore a session and refresh its idle timer. Expired sessions are dropped.
    pub async fn read(&self, session_id: Uuid) -> Option<SessionContext> {
        let mut sessions = self.sessions.write().await;
        let ttl = self.config.ttl;

        match sessions.get_mut(&session_id) {
            Some(state) if state.last_seen.elapsed() <= ttl => {
                state.last_seen = Instant::now();
                Some(state.context(session_id))
            }
            Some(_) => {
                sessions.remove(&session_id);
                tracing::debug!("Portal session expired: {}", session_id);
                None
            }
            None => None,
        }
    }

    /// Record a successful login
    pub async fn store_login(
        &self,
        session_id: Uuid,
        credentials: BackendCredentials,
        user: UserProfile,
    ) {
        let mut sessions = self.sessions.write().await;
        let state = sessions
            .entry(session_id)
            .or_insert_with(SessionState::fresh);
        state.credentials = credentials;
        state.user = Some(user);
        state.last_seen = Instant::now();
    }

    pub async fn set_user(&self, session_id: Uuid, user: Option<UserProfile>) {
        if let Some(state) = self.sessions.write().await.get_mut(&session_id) {
            state.user = user;
        }
    }

    /// Forget the backend credentials and cached user, keeping the session id
    pub async fn clear(&self, session_id: Uuid) {
        if let Some(state) = self.sessions.write().await.get_mut(&session_id) {
            state.credentials = BackendCredentials::default();
            state.user = None;
        }
    }

    /// Drop idle sessions; returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.config.ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, state| state.last_seen.elapsed() <= ttl);
        before - sessions.len()
    }
}
