use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::ServerSettings;
use super::traits::{IdentityProvider, MailApi, SessionStore};
use crate::oauth::OAuthConfig;

/// Shared state for the route handlers.
pub(crate) struct AppState<P, M, S> {
    pub(crate) provider: Arc<P>,
    pub(crate) mail: Arc<M>,
    pub(crate) store: Arc<S>,
    pub(crate) oauth: Arc<OAuthConfig>,
    pub(crate) settings: ServerSettings,
}

// Manual Clone: avoid derive adding `P: Clone, M: Clone, S: Clone` bounds.
impl<P, M, S> Clone for AppState<P, M, S> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            mail: self.mail.clone(),
            store: self.store.clone(),
            oauth: self.oauth.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<P: IdentityProvider, M: MailApi, S: SessionStore> FromRef<AppState<P, M, S>> for Key {
    fn from_ref(state: &AppState<P, M, S>) -> Self {
        state.settings.cookie_key.clone()
    }
}
