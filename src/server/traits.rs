use std::future::Future;

use serde_json::Value as JsonValue;
use url::Url;

use super::session::SessionRecord;
use crate::error::Error;
use crate::graph::GraphClient;
use crate::oauth::{AuthClient, AuthorizationRequest, TokenExchangeRequest};
use crate::types::{AccessToken, SessionId};

/// Identity provider side of the authorization-code flow.
///
/// [`AuthClient`] is the production implementation; tests substitute stubs.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Build the URL the user agent is redirected to for sign-in.
    fn authorization_url(
        &self,
        request: &AuthorizationRequest,
    ) -> impl Future<Output = Result<Url, Error>> + Send;

    /// Redeem an authorization code for an access token.
    fn exchange_code(
        &self,
        request: &TokenExchangeRequest,
    ) -> impl Future<Output = Result<AccessToken, Error>> + Send;
}

/// Protected mail API called on behalf of the signed-in user.
pub trait MailApi: Send + Sync + 'static {
    /// Fetch the user's messages. Every call goes to the API; nothing is cached.
    fn list_messages(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = Result<Vec<JsonValue>, Error>> + Send;
}

/// Session persistence keyed by the cookie-delivered [`SessionId`].
///
/// `save` replaces the whole record. Implementations decide retention
/// (in-memory, external cache, ...).
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStore for RedisSessions {
///     async fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, ...> {
///         self.get_json(id.as_str()).await
///     }
///
///     async fn save(&self, id: &SessionId, record: SessionRecord) -> Result<(), ...> {
///         self.set_json(id.as_str(), &record).await
///     }
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Look up a session record. `None` if the session is unknown or expired.
    fn load(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<SessionRecord>, Box<dyn std::error::Error + Send + Sync>>>
           + Send;

    /// Store `record` under `id`, replacing any previous record.
    fn save(
        &self,
        id: &SessionId,
        record: SessionRecord,
    ) -> impl Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send;
}

impl IdentityProvider for AuthClient {
    async fn authorization_url(&self, request: &AuthorizationRequest) -> Result<Url, Error> {
        AuthClient::authorization_url(self, request)
    }

    async fn exchange_code(&self, request: &TokenExchangeRequest) -> Result<AccessToken, Error> {
        let response = AuthClient::exchange_code(self, request).await?;
        Ok(AccessToken::new(response.access_token))
    }
}

impl MailApi for GraphClient {
    async fn list_messages(&self, token: &AccessToken) -> Result<Vec<JsonValue>, Error> {
        GraphClient::list_messages(self, token).await
    }
}
