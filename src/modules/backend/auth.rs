use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::Result;
use crate::modules::backend::client::{BackendCredentials, BackendSession};
use crate::modules::backend::envelope;
use crate::modules::backend::models::UserProfile;

/// What a successful login leaves behind
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub credentials: BackendCredentials,
    pub user: UserProfile,
}

/// Pull the CSRF token out of a login/registration body, if the backend sent one
fn csrf_from_body(body: &Value) -> Option<String> {
    ["/csrfToken", "/csrf_token", "/data/csrfToken", "/data/csrf_token"]
        .iter()
        .find_map(|p| body.pointer(p))
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl BackendSession {
    /// Log in and capture the cookies and CSRF token the backend hands out
    pub async fn login<B: Serialize + ?Sized>(&self, credentials: &B) -> Result<LoginOutcome> {
        let reply = self
            .call(Method::POST, "/auth/login", Some(credentials))
            .await?;

        // Cookies from the reply are already merged in
        let mut captured = self.credentials();
        if let Some(token) = csrf_from_body(&reply.body) {
            captured.csrf_token = Some(token);
        }

        let user = envelope::decode(envelope::payload(reply.body, Some("user")), "user")?;

        Ok(LoginOutcome {
            credentials: captured,
            user,
        })
    }

    pub async fn register<B: Serialize + ?Sized>(&self, registration: &B) -> Result<UserProfile> {
        self.send(
            Method::POST,
            "/auth/register",
            registration,
            Some("user"),
            "user",
        )
        .await
    }

    pub async fn logout(&self) -> Result<()> {
        self.execute(Method::POST, "/auth/logout").await
    }
}
