use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::Key;

use super::cookies;
use super::error::AppError;
use super::session::SessionRecord;
use super::state::AppState;
use super::traits::{IdentityProvider, MailApi, SessionStore};
use crate::ids::generate_session_id;
use crate::types::SessionId;

/// The caller's session, resolved from the private session cookie.
///
/// A request without a readable session cookie gets a fresh id and an
/// empty record; `is_new` tells the handler to issue the cookie. An id the
/// store no longer knows (restart, expiry) resolves to an empty record.
#[derive(Debug, Clone)]
pub(crate) struct CurrentSession {
    pub(crate) id: SessionId,
    pub(crate) record: SessionRecord,
    pub(crate) is_new: bool,
}

impl<P, M, S> FromRequestParts<AppState<P, M, S>> for CurrentSession
where
    P: IdentityProvider,
    M: MailApi,
    S: SessionStore,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<P, M, S>,
    ) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar<Key> = PrivateCookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Store("cookie jar unavailable".into()))?;

        let Some(id) = cookies::get_session_id(&jar, &state.settings.session_cookie_name) else {
            return Ok(Self {
                id: generate_session_id(),
                record: SessionRecord::default(),
                is_new: true,
            });
        };

        let id = SessionId(id);
        let record = state
            .store
            .load(&id)
            .await
            .map_err(|e| AppError::Store(e.to_string()))?
            .unwrap_or_default();

        Ok(Self {
            id,
            record,
            is_new: false,
        })
    }
}
