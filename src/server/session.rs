use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};

use super::traits::SessionStore;
use crate::types::{AccessToken, SessionId};

/// Per-session server-side data.
///
/// Holds at most one access token, written by the sign-in callback and
/// read by the mail route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: Option<AccessToken>,
}

impl SessionRecord {
    #[must_use]
    pub fn with_token(token: AccessToken) -> Self {
        Self { token: Some(token) }
    }

    /// The stored token, if present and non-empty.
    #[must_use]
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.token.as_ref().filter(|t| !t.is_empty())
    }
}

/// Single-process session store backed by a bounded concurrent cache.
///
/// Sessions vanish on restart. With an idle timeout configured, a session
/// not read or written for that long is dropped.
///
/// The cache is bounded by `max_sessions`. Once full, its admission policy
/// may evict an existing session or decline a new one, and `save` still
/// returns `Ok`. A declined sign-in shows up as a redirect back to `/auth`.
#[derive(Clone)]
pub struct MemorySessionStore {
    inner: Cache<SessionId, SessionRecord>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(max_sessions: u64) -> Self {
        Self {
            inner: Cache::new(max_sessions),
        }
    }

    #[must_use]
    pub fn with_idle_timeout(max_sessions: u64, idle: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(idle)
                .build(),
        }
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.inner.get(id).await)
    }

    async fn save(
        &self,
        id: &SessionId,
        record: SessionRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.inner.insert(id.clone(), record).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId(s.to_string())
    }

    #[tokio::test]
    async fn unknown_session_loads_none() {
        let store = MemorySessionStore::new(16);
        assert_eq!(store.load(&sid("nope")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_replaces_record() {
        let store = MemorySessionStore::new(16);
        let id = sid("a");

        store
            .save(&id, SessionRecord::with_token(AccessToken::new("first")))
            .await
            .unwrap();
        store
            .save(&id, SessionRecord::with_token(AccessToken::new("second")))
            .await
            .unwrap();

        let record = store.load(&id).await.unwrap().unwrap();
        assert_eq!(record.access_token(), Some(&AccessToken::new("second")));
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let store = MemorySessionStore::new(16);
        store
            .save(&sid("a"), SessionRecord::with_token(AccessToken::new("tok-a")))
            .await
            .unwrap();

        assert_eq!(store.load(&sid("b")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let store = MemorySessionStore::with_idle_timeout(16, Duration::from_millis(50));
        let id = sid("a");
        store
            .save(&id, SessionRecord::with_token(AccessToken::new("tok")))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.load(&id).await.unwrap(), None);
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let record = SessionRecord::with_token(AccessToken::new(""));
        assert!(record.access_token().is_none());
        assert!(SessionRecord::default().access_token().is_none());
    }
}
