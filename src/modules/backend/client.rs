use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::core::config::BackendConfig;
use crate::core::error::{AppError, Result};
use crate::modules::backend::envelope;

/// Header the backend checks on every state-changing request
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Cookie the backend uses to hand out the CSRF token
pub const CSRF_COOKIE: &str = "ics_csrf_token";

/// Credentials a visitor holds against the backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendCredentials {
    /// Cookies set by the backend (session cookie, CSRF cookie)
    pub cookies: BTreeMap<String, String>,
    /// CSRF token handed out explicitly in a response body
    pub csrf_token: Option<String>,
}

impl BackendCredentials {
    /// Explicit token first, the CSRF cookie otherwise
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.cookies.get(CSRF_COOKIE).map(String::as_str))
            .filter(|t| !t.is_empty())
    }

    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn merge_cookies(&mut self, cookies: impl IntoIterator<Item = (String, String)>) {
        for (name, value) in cookies {
            if value.is_empty() {
                // Expired/cleared by the backend
                self.cookies.remove(&name);
            } else {
                self.cookies.insert(name, value);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.csrf_token.is_none()
    }
}

/// Credentials shared by a portal session and every gateway call made for it.
///
/// Cookies the backend sets on any response are merged in immediately, so a
/// later call in the same request sends them, and are kept aside until the
/// session middleware writes them back to the session store.
#[derive(Debug, Clone, Default)]
pub struct SharedCredentials(Arc<Mutex<CredentialsState>>);

#[derive(Debug, Default)]
struct CredentialsState {
    current: BackendCredentials,
    received: Vec<(String, String)>,
}

impl SharedCredentials {
    pub fn new(credentials: BackendCredentials) -> Self {
        Self(Arc::new(Mutex::new(CredentialsState {
            current: credentials,
            received: Vec::new(),
        })))
    }

    // Never held across an await
    fn lock(&self) -> MutexGuard<'_, CredentialsState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> BackendCredentials {
        self.lock().current.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().current.is_empty()
    }

    /// Apply cookies from a backend response
    pub fn absorb(&self, cookies: Vec<(String, String)>) {
        if cookies.is_empty() {
            return;
        }
        let mut state = self.lock();
        state.current.merge_cookies(cookies.iter().cloned());
        state.received.extend(cookies);
    }

    /// Cookies received since the last call, in arrival order
    pub fn take_received(&self) -> Vec<(String, String)> {
        std::mem::take(&mut self.lock().received)
    }
}

impl From<BackendCredentials> for SharedCredentials {
    fn from(credentials: BackendCredentials) -> Self {
        Self::new(credentials)
    }
}

/// Parsed backend reply, before the payload is pulled out of the envelope
#[derive(Debug)]
pub struct BackendReply {
    pub status: u16,
    pub body: Value,
}

/// Binary passthrough (PDFs, uploaded documents)
#[derive(Debug)]
pub struct DownloadedFile {
    pub content_type: String,
    pub content_disposition: Option<String>,
    pub bytes: Vec<u8>,
}

/// Shared gateway to the consular backend.
///
/// Holds the connection pool; per-visitor calls go through [`BackendSession`].
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Arc<str>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: Arc::from(config.base_url.as_str()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bind the gateway to one visitor's credentials
    pub fn session(&self, credentials: SharedCredentials) -> BackendSession {
        BackendSession {
            http: self.http.clone(),
            base_url: Arc::clone(&self.base_url),
            credentials,
        }
    }

    pub fn anonymous(&self) -> BackendSession {
        self.session(SharedCredentials::default())
    }
}

/// Gateway bound to one visitor's cookies and CSRF token
#[derive(Clone)]
pub struct BackendSession {
    http: reqwest::Client,
    base_url: Arc<str>,
    credentials: SharedCredentials,
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn set_cookies(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(parse_set_cookie)
        .collect()
}

/// `name=value; Path=/; HttpOnly` -> `(name, value)`
pub fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().trim_matches('"').to_string()))
}

impl BackendSession {
    /// Credentials as they stand now, including cookies set by earlier replies
    pub fn credentials(&self) -> BackendCredentials {
        self.credentials.snapshot()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method.clone(), self.url(path))
            .header(ACCEPT, "application/json");

        let credentials = self.credentials.snapshot();
        if let Some(cookie) = credentials.cookie_header() {
            builder = builder.header(COOKIE, cookie);
        }

        if is_mutating(&method) {
            match credentials.csrf_token() {
                Some(token) => builder = builder.header(CSRF_HEADER, token),
                None => tracing::debug!("No CSRF token available for {} {}", method, path),
            }
        }

        builder
    }

    /// Send and decode the envelope; failures become `AppError::Backend`
    async fn dispatch(&self, builder: reqwest::RequestBuilder, path: &str) -> Result<BackendReply> {
        tracing::debug!("Backend request: {}", path);

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Backend request to {} failed: {}", path, e);
            AppError::ExternalServiceError(format!("Backend request failed: {}", e))
        })?;

        let status = response.status().as_u16();
        // Error replies can rotate cookies too
        self.credentials.absorb(set_cookies(response.headers()));

        let text = response.text().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to read backend response: {}", e))
        })?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => value,
                // Non-JSON error pages still carry a readable message
                Err(_) if !(200..300).contains(&status) => {
                    serde_json::json!({ "message": text.chars().take(200).collect::<String>() })
                }
                Err(e) => {
                    tracing::error!("Backend returned non-JSON body for {}: {}", path, e);
                    return Err(AppError::ExternalServiceError(format!(
                        "Backend returned invalid JSON: {}",
                        e
                    )));
                }
            }
        };

        if !(200..300).contains(&status) {
            tracing::warn!("Backend {} responded with HTTP {}", path, status);
        }

        let body = envelope::unwrap_envelope(status, body)?;

        Ok(BackendReply { status, body })
    }

    /// Raw reply, for callers that need the full envelope
    pub async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<BackendReply> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.dispatch(builder, path).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        key: Option<&str>,
        what: &str,
    ) -> Result<T> {
        let builder = self.request(Method::GET, path).query(query);
        let reply = self.dispatch(builder, path).await?;
        envelope::decode(envelope::payload(reply.body, key), what)
    }

    /// GET a list plus its total count (falls back to the page length)
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        key: Option<&str>,
        what: &str,
    ) -> Result<(Vec<T>, i64)> {
        let builder = self.request(Method::GET, path).query(query);
        let reply = self.dispatch(builder, path).await?;
        let total = envelope::total_count(&reply.body);

        let mut items = envelope::payload(reply.body, key);
        // Paginated lists nest their rows one level deeper
        if items.is_object() {
            for nested in ["items", "results", "rows"] {
                if let Some(rows) = items.get_mut(nested) {
                    items = rows.take();
                    break;
                }
            }
        }

        let items: Vec<T> = envelope::decode(items, what)?;
        let total = total.unwrap_or(items.len() as i64);
        Ok((items, total))
    }

    pub async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        key: Option<&str>,
        what: &str,
    ) -> Result<T> {
        let reply = self.call(method, path, Some(body)).await?;
        envelope::decode(envelope::payload(reply.body, key), what)
    }

    /// Mutation whose response body we do not need
    pub async fn execute(&self, method: Method, path: &str) -> Result<()> {
        self.call::<Value>(method, path, None).await?;
        Ok(())
    }

    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        key: Option<&str>,
        what: &str,
    ) -> Result<T> {
        let builder = self.request(Method::POST, path).multipart(form);
        let reply = self.dispatch(builder, path).await?;
        envelope::decode(envelope::payload(reply.body, key), what)
    }

    /// Fetch a binary document without touching the envelope logic on success
    pub async fn download(&self, path: &str) -> Result<DownloadedFile> {
        tracing::debug!("Backend download: {}", path);

        let response = self
            .request(Method::GET, path)
            .header(ACCEPT, "*/*")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Backend download from {} failed: {}", path, e);
                AppError::ExternalServiceError(format!("Backend request failed: {}", e))
            })?;

        let status = response.status().as_u16();
        self.credentials.absorb(set_cookies(response.headers()));
        if !response.status().is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(envelope::extract_error(&body).into_app_error(status));
        }

        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type =
            header(CONTENT_TYPE).unwrap_or_else(|| "application/octet-stream".to_string());
        let content_disposition = header(CONTENT_DISPOSITION);

        let bytes = response.bytes().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to read backend file: {}", e))
        })?;

        Ok(DownloadedFile {
            content_type,
            content_disposition,
            bytes: bytes.to_vec(),
        })
    }
}
