use serde::Deserialize;
use url::Url;

use crate::error::Error;

/// Default Microsoft identity platform host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Scopes the identity platform always grants alongside the requested ones.
const RESERVED_SCOPES: [&str; 3] = ["openid", "profile", "offline_access"];

/// Confidential-client `OAuth2` configuration for the Microsoft identity platform.
///
/// Required fields are constructor parameters — no runtime "missing field" errors.
///
/// ```rust,ignore
/// use graph_mail_oauth::OAuthConfig;
///
/// let config = OAuthConfig::new("client-id", "secret", "tenant-id", "http://localhost:3000/auth/callback".parse()?);
/// let config = config.with_scopes(vec!["user.read".into()]);
/// ```
#[derive(Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) tenant_id: String,
    pub(crate) authority_host: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) scopes: Vec<String>,
}

impl OAuthConfig {
    /// Create a new confidential-client configuration.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            redirect_uri,
            authority_host: DEFAULT_AUTHORITY_HOST
                .parse()
                .expect("valid default URL"),
            scopes: vec!["user.read".into(), "mail.read".into()],
        }
    }

    /// Override the identity platform host (sovereign clouds, tests).
    #[must_use]
    pub fn with_authority_host(mut self, url: Url) -> Self {
        self.authority_host = url;
        self
    }

    /// Override the requested scopes (default: `["user.read", "mail.read"]`).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Tenant authority, e.g. `https://login.microsoftonline.com/<tenant>/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the tenant id does not form a valid path segment.
    pub fn authority(&self) -> Result<Url, Error> {
        let tenant = urlencoding::encode(&self.tenant_id);
        Ok(self.authority_host.join(&format!("{tenant}/"))?)
    }

    /// Authorization endpoint for the configured tenant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the authority cannot be built.
    pub fn authorize_endpoint(&self) -> Result<Url, Error> {
        Ok(self.authority()?.join("oauth2/v2.0/authorize")?)
    }

    /// Token endpoint for the configured tenant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the authority cannot be built.
    pub fn token_endpoint(&self) -> Result<Url, Error> {
        Ok(self.authority()?.join("oauth2/v2.0/token")?)
    }

    /// Parameters for the first leg of the flow.
    #[must_use]
    pub fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            scopes: self.scopes.clone(),
            redirect_uri: self.redirect_uri.clone(),
        }
    }

    /// Parameters for redeeming `code`.
    ///
    /// Scopes and redirect URI come from the same configuration as
    /// [`authorization_request`](Self::authorization_request); the provider
    /// rejects the exchange if either differs.
    #[must_use]
    pub fn token_request(&self, code: impl Into<String>) -> TokenExchangeRequest {
        TokenExchangeRequest {
            code: code.into(),
            scopes: self.scopes.clone(),
            redirect_uri: self.redirect_uri.clone(),
        }
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("authority_host", &self.authority_host.as_str())
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Parameters sent to the authorization endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub scopes: Vec<String>,
    pub redirect_uri: Url,
}

/// Parameters sent to the token endpoint to redeem an authorization code.
#[derive(Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TokenExchangeRequest {
    pub code: String,
    pub scopes: Vec<String>,
    pub redirect_uri: Url,
}

impl std::fmt::Debug for TokenExchangeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExchangeRequest")
            .field("code", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("redirect_uri", &self.redirect_uri.as_str())
            .finish()
    }
}

/// Token response from the identity platform token endpoint.
#[derive(Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// `OAuth2` authorization-code client for the Microsoft identity platform.
pub struct AuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl AuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the URL the user agent is sent to for sign-in and consent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the authority endpoint cannot be built.
    pub fn authorization_url(&self, request: &AuthorizationRequest) -> Result<Url, Error> {
        let mut url = self.config.authorize_endpoint()?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", request.redirect_uri.as_str())
            .append_pair("response_mode", "query")
            .append_pair("scope", &scope_param(&request.scopes));

        Ok(url)
    }

    /// Redeem an authorization code for tokens.
    ///
    /// Codes are single-use, so a failure is returned as-is and never retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network or decode failure, or
    /// [`Error::OAuth`] if the token endpoint rejects the request.
    pub async fn exchange_code(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<TokenResponse, Error> {
        let scope = scope_param(&request.scopes);
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", request.code.as_str()),
            ("redirect_uri", request.redirect_uri.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_endpoint()?)
            .form(&params)
            .send()
            .await?;

        let response = ensure_success(response, "token exchange").await?;
        let token = response.json::<TokenResponse>().await?;
        if token.access_token.is_empty() {
            return Err(Error::OAuth {
                operation: "token exchange",
                status: None,
                detail: "response did not contain an access token".into(),
            });
        }
        Ok(token)
    }
}

/// Space-separated scope list with the identity platform's reserved scopes
/// appended once.
fn scope_param(scopes: &[String]) -> String {
    let mut all: Vec<&str> = Vec::with_capacity(scopes.len() + RESERVED_SCOPES.len());
    for scope in scopes.iter().map(String::as_str).chain(RESERVED_SCOPES) {
        if !scope.is_empty() && !all.iter().any(|s| s.eq_ignore_ascii_case(scope)) {
            all.push(scope);
        }
    }
    all.join(" ")
}

/// Checks HTTP response status; returns the response on success or an error with details.
///
/// Only the provider's `error` / `error_description` are kept so that echoed
/// request data never ends up in logs.
async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        return Ok(response);
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        error_description: Option<String>,
    }

    let status = response.status().as_u16();
    let detail = match response.json::<ErrorBody>().await {
        Ok(ErrorBody {
            error: Some(error),
            error_description,
        }) => match error_description {
            Some(desc) => format!("{error}: {desc}"),
            None => error,
        },
        _ => "unrecognized error response".into(),
    };

    Err(Error::OAuth {
        operation,
        status: Some(status),
        detail,
    })
}
