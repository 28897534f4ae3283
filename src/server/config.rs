use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use url::Url;

use super::error::ConfigError;
use crate::graph::DEFAULT_GRAPH_BASE_URL;
use crate::oauth::OAuthConfig;

/// Minimum length of the session-signing secret, in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_SESSIONS: u64 = 10_000;

/// Shared server settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct ServerSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl: Option<Duration>,
    pub(crate) secure_cookies: bool,
}

/// Process-wide configuration, loaded once at startup and passed into
/// [`app_routes`](super::app_routes).
///
/// Use [`from_env()`](AppConfig::from_env) for convention-based setup,
/// or [`new()`](AppConfig::new) with `with_*` methods for full control.
pub struct AppConfig {
    pub(super) oauth: OAuthConfig,
    pub(super) graph_base_url: Url,
    pub(super) listen_addr: SocketAddr,
    pub(super) max_sessions: u64,
    pub(super) settings: ServerSettings,
}

impl AppConfig {
    /// Create config from the OAuth client settings and the session-signing secret.
    ///
    /// The cookie encryption key is derived from `session_secret`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the secret is shorter than
    /// [`MIN_SESSION_SECRET_LEN`] bytes.
    pub fn new(oauth: OAuthConfig, session_secret: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            oauth,
            graph_base_url: DEFAULT_GRAPH_BASE_URL.parse().expect("valid default URL"),
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_sessions: DEFAULT_MAX_SESSIONS,
            settings: ServerSettings {
                cookie_key: derive_cookie_key(session_secret)?,
                session_cookie_name: "__mail_session".into(),
                session_ttl: None,
                secure_cookies: false,
            },
        })
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `CLIENT_ID`: application (client) id
    /// - `TENANT_ID`: directory (tenant) id or `common` / `organizations`
    /// - `CLIENT_SECRET`: confidential client secret
    /// - `REDIRECT_URI`: callback URI registered for the app (must be a valid URL)
    /// - `SESSION_SECRET`: session cookie secret, at least 32 bytes
    ///
    /// # Optional env vars
    /// - `AUTHORITY_HOST`: identity platform host (default `https://login.microsoftonline.com`)
    /// - `GRAPH_BASE_URL`: Graph endpoint (default `https://graph.microsoft.com/v1.0/`)
    /// - `OAUTH_SCOPES`: comma-separated scopes (default `user.read,mail.read`)
    /// - `BIND_ADDR`: listen address (default `0.0.0.0`)
    /// - `PORT`: listen port (default `3000`)
    /// - `SESSION_TTL_MINUTES`: drop sessions idle for this long
    /// - `SESSION_CAPACITY`: maximum number of in-memory sessions (default `10000`)
    /// - `SESSION_COOKIE_NAME`: session cookie name (default `__mail_session`)
    /// - `SECURE_COOKIES`: `"1"` or `"true"` to mark the cookie `Secure`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or any value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or any value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let client_id = required("CLIENT_ID")?;
        let tenant_id = required("TENANT_ID")?;
        let client_secret = required("CLIENT_SECRET")?;
        let redirect_uri = parse_url("REDIRECT_URI", &required("REDIRECT_URI")?)?;
        let session_secret = required("SESSION_SECRET")?;

        let mut oauth = OAuthConfig::new(client_id, client_secret, tenant_id, redirect_uri);
        if let Some(host) = var("AUTHORITY_HOST") {
            oauth = oauth.with_authority_host(parse_url("AUTHORITY_HOST", &host)?);
        }
        if let Some(scopes) = var("OAUTH_SCOPES") {
            let scopes: Vec<String> = scopes
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if scopes.is_empty() {
                return Err(ConfigError::Invalid {
                    var: "OAUTH_SCOPES",
                    reason: "at least one scope is required".into(),
                });
            }
            oauth = oauth.with_scopes(scopes);
        }

        // Both provider endpoints are built per request; fail here instead.
        for endpoint in [oauth.authorize_endpoint(), oauth.token_endpoint()] {
            endpoint.map_err(|e| ConfigError::Invalid {
                var: "AUTHORITY_HOST",
                reason: format!("{e}"),
            })?;
        }

        let mut config = Self::new(oauth, &session_secret)?;

        if let Some(url) = var("GRAPH_BASE_URL") {
            config = config.with_graph_base_url(parse_url("GRAPH_BASE_URL", &url)?);
        }

        let ip: IpAddr = match var("BIND_ADDR") {
            Some(addr) => addr.trim().parse().map_err(|e| ConfigError::Invalid {
                var: "BIND_ADDR",
                reason: format!("{e}"),
            })?,
            None => config.listen_addr.ip(),
        };
        let port: u16 = match var("PORT") {
            Some(port) => parse_number("PORT", &port)?,
            None => DEFAULT_PORT,
        };
        config = config.with_listen_addr(SocketAddr::new(ip, port));

        if let Some(minutes) = var("SESSION_TTL_MINUTES") {
            let minutes: u64 = parse_number("SESSION_TTL_MINUTES", &minutes)?;
            if minutes == 0 {
                return Err(ConfigError::Invalid {
                    var: "SESSION_TTL_MINUTES",
                    reason: "must be greater than zero".into(),
                });
            }
            config = config.with_session_ttl(Duration::from_secs(minutes * 60));
        }
        if let Some(capacity) = var("SESSION_CAPACITY") {
            config = config.with_max_sessions(parse_number("SESSION_CAPACITY", &capacity)?);
        }
        if let Some(name) = var("SESSION_COOKIE_NAME") {
            config = config.with_session_cookie_name(name.trim());
        }

        let secure = matches!(
            var("SECURE_COOKIES").as_deref().map(str::trim),
            Some("1") | Some("true"),
        );

        Ok(config.with_secure_cookies(secure))
    }

    #[must_use]
    pub fn with_graph_base_url(mut self, url: Url) -> Self {
        self.graph_base_url = url;
        self
    }

    #[must_use]
    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    #[must_use]
    pub fn with_max_sessions(mut self, max_sessions: u64) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.settings.session_ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn oauth(&self) -> &OAuthConfig {
        &self.oauth
    }

    #[must_use]
    pub fn graph_base_url(&self) -> &Url {
        &self.graph_base_url
    }

    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    #[must_use]
    pub fn max_sessions(&self) -> u64 {
        self.max_sessions
    }

    #[must_use]
    pub fn session_ttl(&self) -> Option<Duration> {
        self.settings.session_ttl
    }
}

/// Expands the session secret into the 64-byte key used for cookie encryption.
fn derive_cookie_key(secret: &str) -> Result<Key, ConfigError> {
    if secret.len() < MIN_SESSION_SECRET_LEN {
        return Err(ConfigError::Invalid {
            var: "SESSION_SECRET",
            reason: format!("must be at least {MIN_SESSION_SECRET_LEN} bytes"),
        });
    }
    let digest = Sha512::digest(secret.as_bytes());
    Ok(Key::from(digest.as_slice()))
}

/// Parses an absolute `http`/`https` URL that relative paths can be joined onto.
fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url: Url = value.trim().parse().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("{e}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("expected an http(s) URL, got scheme `{}`", url.scheme()),
        });
    }
    Ok(url)
}

fn parse_number<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("{e}"),
    })
}
