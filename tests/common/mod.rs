//! Shared helpers for router-level tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response};
use serde_json::Value as JsonValue;
use url::Url;

use graph_mail_oauth::server::{AppConfig, IdentityProvider, MailApi, SessionRecord, SessionStore};
use graph_mail_oauth::{
    AccessToken, AuthClient, AuthorizationRequest, Error, OAuthConfig, SessionId,
    TokenExchangeRequest,
};

pub const SESSION_SECRET: &str = "test-session-secret-0123456789abcdef";
pub const REDIRECT_URI: &str = "http://localhost:3000/auth/callback";
pub const SESSION_COOKIE: &str = "__mail_session";

pub fn oauth_config() -> OAuthConfig {
    OAuthConfig::new("client-123", "s3cr3t", "contoso", REDIRECT_URI.parse().unwrap())
}

pub fn app_config() -> AppConfig {
    AppConfig::new(oauth_config(), SESSION_SECRET).unwrap()
}

pub fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Identity provider stub
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ProviderInner {
    next_token: Mutex<Option<String>>,
    broken_authority: Mutex<bool>,
    authorization_requests: Mutex<Vec<AuthorizationRequest>>,
    exchange_requests: Mutex<Vec<TokenExchangeRequest>>,
}

/// Builds real authorization URLs; the exchange returns the configured token
/// or fails when none is set.
#[derive(Clone, Default)]
pub struct StubProvider {
    inner: Arc<ProviderInner>,
}

impl StubProvider {
    pub fn returning(token: &str) -> Self {
        let stub = Self::default();
        stub.set_token(Some(token));
        stub
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// Authorization URL construction fails as with an unusable authority.
    pub fn with_broken_authority(self) -> Self {
        *self.inner.broken_authority.lock().unwrap() = true;
        self
    }

    pub fn set_token(&self, token: Option<&str>) {
        *self.inner.next_token.lock().unwrap() = token.map(str::to_string);
    }

    pub fn authorization_requests(&self) -> Vec<AuthorizationRequest> {
        self.inner.authorization_requests.lock().unwrap().clone()
    }

    pub fn exchange_requests(&self) -> Vec<TokenExchangeRequest> {
        self.inner.exchange_requests.lock().unwrap().clone()
    }
}

impl IdentityProvider for StubProvider {
    async fn authorization_url(&self, request: &AuthorizationRequest) -> Result<Url, Error> {
        self.inner
            .authorization_requests
            .lock()
            .unwrap()
            .push(request.clone());
        if *self.inner.broken_authority.lock().unwrap() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        AuthClient::new(oauth_config()).authorization_url(request)
    }

    async fn exchange_code(&self, request: &TokenExchangeRequest) -> Result<AccessToken, Error> {
        self.inner
            .exchange_requests
            .lock()
            .unwrap()
            .push(request.clone());
        match self.inner.next_token.lock().unwrap().clone() {
            Some(token) => Ok(AccessToken::new(token)),
            None => Err(Error::OAuth {
                operation: "token exchange",
                status: Some(400),
                detail: "invalid_grant: AADSTS70008 expired code".into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Mail API stub
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MailInner {
    response: Mutex<Option<Vec<JsonValue>>>,
    tokens_seen: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct StubMail {
    inner: Arc<MailInner>,
}

impl StubMail {
    pub fn returning(messages: JsonValue) -> Self {
        let stub = Self::default();
        let items = messages.as_array().cloned().unwrap_or_default();
        *stub.inner.response.lock().unwrap() = Some(items);
        stub
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.inner.tokens_seen.lock().unwrap().clone()
    }
}

impl MailApi for StubMail {
    async fn list_messages(&self, token: &AccessToken) -> Result<Vec<JsonValue>, Error> {
        self.inner
            .tokens_seen
            .lock()
            .unwrap()
            .push(token.secret().to_string());
        self.inner.response.lock().unwrap().clone().ok_or(Error::Api {
            operation: "list messages",
            status: 401,
            detail: "InvalidAuthenticationToken: Lifetime validation failed".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Session store stub
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct RecordingStore {
    records: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
}

impl RecordingStore {
    pub fn snapshot(&self) -> HashMap<SessionId, SessionRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Tokens of all stored sessions.
    pub fn tokens(&self) -> Vec<String> {
        self.snapshot()
            .values()
            .filter_map(|r| r.token.as_ref().map(|t| t.secret().to_string()))
            .collect()
    }
}

impl SessionStore for RecordingStore {
    async fn load(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn save(
        &self,
        id: &SessionId,
        record: SessionRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.records.lock().unwrap().insert(id.clone(), record);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    use tower::ServiceExt;

    let mut request = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// `name=value` of the session cookie set by the response, ready for a `Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
