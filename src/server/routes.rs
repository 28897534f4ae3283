use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use super::config::{AppConfig, ServerSettings};
use super::cookies;
use super::error::AppError;
use super::extractor::CurrentSession;
use super::session::SessionRecord;
use super::state::AppState;
use super::traits::{IdentityProvider, MailApi, SessionStore};
use crate::error::Error;

/// Starts the sign-in flow.
pub const AUTH_PATH: &str = "/auth";
/// Redirect URI path the identity provider returns to.
pub const CALLBACK_PATH: &str = "/auth/callback";
/// Protected mail listing.
pub const EMAILS_PATH: &str = "/emails";

/// Create the application router.
pub fn app_routes<P, M, S>(config: AppConfig, provider: P, mail: M, session_store: S) -> Router
where
    P: IdentityProvider,
    M: MailApi,
    S: SessionStore,
{
    let state = AppState {
        provider: Arc::new(provider),
        mail: Arc::new(mail),
        store: Arc::new(session_store),
        oauth: Arc::new(config.oauth),
        settings: config.settings,
    };

    Router::new()
        .route(AUTH_PATH, get(auth::<P, M, S>))
        .route(CALLBACK_PATH, get(callback::<P, M, S>))
        .route(EMAILS_PATH, get(emails::<P, M, S>))
        .with_state(state)
}

// ── Auth ───────────────────────────────────────────────────────────

async fn auth<P: IdentityProvider, M: MailApi, S: SessionStore>(
    State(state): State<AppState<P, M, S>>,
    jar: PrivateCookieJar,
    session: CurrentSession,
) -> Result<(PrivateCookieJar, Response), AppError> {
    let request = state.oauth.authorization_request();

    let url = state
        .provider
        .authorization_url(&request)
        .await
        .map_err(AppError::AuthUrlConstruction)?;

    let jar = issue_session_cookie(jar, &session, &state.settings);
    Ok((jar, found(url.as_str())))
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn callback<P: IdentityProvider, M: MailApi, S: SessionStore>(
    State(state): State<AppState<P, M, S>>,
    jar: PrivateCookieJar,
    session: CurrentSession,
    Query(params): Query<CallbackParams>,
) -> Result<(PrivateCookieJar, Response), AppError> {
    if let Some(error) = params.error {
        let desc = params.error_description.as_deref().unwrap_or("Unknown error");
        tracing::warn!(error = %error, description = %desc, "Authorization denied by identity provider");
        return Err(AppError::TokenExchange(Error::OAuth {
            operation: "authorization",
            status: None,
            detail: error,
        }));
    }

    let code = params.code.filter(|c| !c.is_empty()).ok_or_else(|| {
        AppError::TokenExchange(Error::OAuth {
            operation: "authorization",
            status: None,
            detail: "missing authorization code".into(),
        })
    })?;

    let request = state.oauth.token_request(code);

    let token = state
        .provider
        .exchange_code(&request)
        .await
        .map_err(AppError::TokenExchange)?;

    if token.is_empty() {
        return Err(AppError::TokenExchange(Error::OAuth {
            operation: "token exchange",
            status: None,
            detail: "empty access token".into(),
        }));
    }

    state
        .store
        .save(&session.id, SessionRecord::with_token(token))
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    tracing::info!(new_session = session.is_new, "Sign-in completed");

    let jar = issue_session_cookie(jar, &session, &state.settings);
    Ok((jar, found(EMAILS_PATH)))
}

// ── Emails ─────────────────────────────────────────────────────────

async fn emails<P: IdentityProvider, M: MailApi, S: SessionStore>(
    State(state): State<AppState<P, M, S>>,
    jar: PrivateCookieJar,
    session: CurrentSession,
) -> Result<(PrivateCookieJar, Response), AppError> {
    let jar = issue_session_cookie(jar, &session, &state.settings);

    let Some(token) = session.record.access_token() else {
        tracing::debug!("No access token in session, restarting sign-in");
        return Ok((jar, found(AUTH_PATH)));
    };

    let messages = state
        .mail
        .list_messages(token)
        .await
        .map_err(AppError::DownstreamApi)?;

    tracing::debug!(count = messages.len(), "Fetched messages");

    Ok((jar, Json(messages).into_response()))
}

// ── Helpers ────────────────────────────────────────────────────────

/// `302 Found` to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Sets the session cookie on new sessions, and on every response when a
/// TTL is configured so the browser's expiry slides with the store's idle timeout.
fn issue_session_cookie(
    jar: PrivateCookieJar,
    session: &CurrentSession,
    settings: &ServerSettings,
) -> PrivateCookieJar {
    if !session.is_new && settings.session_ttl.is_none() {
        return jar;
    }
    jar.add(cookies::session_cookie(
        &settings.session_cookie_name,
        session.id.as_str(),
        settings.session_ttl,
        settings.secure_cookies,
    ))
}
