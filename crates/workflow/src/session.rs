//! Client-scoped session storage.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

/// Lifetime of an idle session.
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest idle lifetime a store accepts; longer ones are clamped to it.
pub const MAX_SESSION_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Opaque identifier binding a client to its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a session ID as sent back by the client.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised by session stores.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A stored value does not decode into the requested type.
    #[error("Session value for {key:?} is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The session backend could not be reached.
    #[error("Session backend error: {0}")]
    Backend(String),
}

/// Key-value storage scoped to one client, with a fixed sliding lifetime.
///
/// Reading a missing key, or any key of an expired session, yields `None`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session: SessionId, key: &str) -> Result<Option<Value>, SessionError>;

    async fn put(&self, session: SessionId, key: &str, value: Value) -> Result<(), SessionError>;

    async fn remove(&self, session: SessionId, key: &str) -> Result<(), SessionError>;

    /// Whether the store holds a live session under this id.
    async fn exists(&self, session: SessionId) -> Result<bool, SessionError>;
}

/// Typed helpers on top of [`SessionStore`].
#[async_trait]
pub trait SessionStoreExt: SessionStore {
    /// Reads and decodes a value.
    async fn get_as<T>(&self, session: SessionId, key: &str) -> Result<Option<T>, SessionError>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(session, key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| SessionError::Malformed {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Encodes and stores a value.
    async fn put_as<T>(&self, session: SessionId, key: &str, value: &T) -> Result<(), SessionError>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(value).map_err(|source| SessionError::Malformed {
            key: key.to_string(),
            source,
        })?;
        self.put(session, key, value).await
    }

    /// Reads a string and removes it in the same step.
    async fn pop_string(&self, session: SessionId, key: &str) -> Result<Option<String>, SessionError> {
        let value = self.get(session, key).await?;
        if value.is_some() {
            self.remove(session, key).await?;
        }
        Ok(value.and_then(|v| v.as_str().map(String::from)))
    }
}

// Blanket implementation for all SessionStore implementations
impl<T: SessionStore + ?Sized> SessionStoreExt for T {}

#[derive(Debug)]
struct SessionEntry {
    values: HashMap<String, Value>,
    expires_at: Instant,
}

/// In-memory session store.
///
/// Every access pushes the expiry forward by the configured lifetime.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    lifetime: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_LIFETIME)
    }
}

impl InMemorySessionStore {
    /// Creates a store whose sessions expire after `lifetime` of inactivity.
    pub fn new(lifetime: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            lifetime: lifetime.min(MAX_SESSION_LIFETIME),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        before - sessions.len()
    }

    /// Returns the number of sessions currently held, expired or not.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session: SessionId, key: &str) -> Result<Option<Value>, SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let Some(entry) = sessions.get_mut(&session) else {
            return Ok(None);
        };
        if entry.expires_at <= now {
            sessions.remove(&session);
            return Ok(None);
        }

        entry.expires_at = now + self.lifetime;
        Ok(entry.values.get(key).cloned())
    }

    async fn put(&self, session: SessionId, key: &str, value: Value) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let entry = sessions.entry(session).or_insert_with(|| SessionEntry {
            values: HashMap::new(),
            expires_at: now,
        });
        if entry.expires_at <= now {
            entry.values.clear();
        }

        entry.expires_at = now + self.lifetime;
        entry.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, session: SessionId, key: &str) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if let Some(entry) = sessions.get_mut(&session) {
            if entry.expires_at <= now {
                sessions.remove(&session);
            } else {
                entry.expires_at = now + self.lifetime;
                entry.values.remove(key);
            }
        }
        Ok(())
    }

    async fn exists(&self, session: SessionId) -> Result<bool, SessionError> {
        let now = Instant::now();
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&session)
            .is_some_and(|entry| entry.expires_at > now))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    #[tokio::test]
    async fn get_put_remove() {
        let store = InMemorySessionStore::default();
        let session = SessionId::new();

        assert_eq!(store.get(session, "k").await.unwrap(), None);
        store
            .put(session, "k", serde_json::json!("v"))
            .await
            .unwrap();
        assert_eq!(
            store.get(session, "k").await.unwrap(),
            Some(serde_json::json!("v"))
        );
        store.remove(session, "k").await.unwrap();
        assert_eq!(store.get(session, "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemorySessionStore::default();
        let a = SessionId::new();
        let b = SessionId::new();

        store.put(a, "k", serde_json::json!(1)).await.unwrap();
        assert_eq!(store.get(b, "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn typed_round_trip_and_malformed_value() {
        let store = InMemorySessionStore::default();
        let session = SessionId::new();
        let note = Note {
            text: "hello".into(),
        };

        store.put_as(session, "note", &note).await.unwrap();
        let back: Option<Note> = store.get_as(session, "note").await.unwrap();
        assert_eq!(back, Some(note));

        store
            .put(session, "note", serde_json::json!(42))
            .await
            .unwrap();
        let result: Result<Option<Note>, _> = store.get_as(session, "note").await;
        assert!(matches!(result, Err(SessionError::Malformed { .. })));
    }

    #[tokio::test]
    async fn pop_string_reads_once() {
        let store = InMemorySessionStore::default();
        let session = SessionId::new();
        store
            .put(session, "flash", serde_json::json!("Saved"))
            .await
            .unwrap();

        assert_eq!(
            store.pop_string(session, "flash").await.unwrap(),
            Some("Saved".to_string())
        );
        assert_eq!(store.pop_string(session, "flash").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_expires() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let session = SessionId::new();
        store.put(session, "k", serde_json::json!(1)).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(store.get(session, "k").await.unwrap(), None);
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_slides_expiry() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let session = SessionId::new();
        store.put(session, "k", serde_json::json!(1)).await.unwrap();

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(45)).await;
            assert!(store.get(session, "k").await.unwrap().is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired_sessions() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let old = SessionId::new();
        store.put(old, "k", serde_json::json!(1)).await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        let fresh = SessionId::new();
        store.put(fresh, "k", serde_json::json!(2)).await.unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.purge_expired().await, 1);
        assert!(store.get(fresh, "k").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn exists_only_for_issued_live_sessions() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let session = SessionId::new();

        assert!(!store.exists(session).await.unwrap());
        assert_eq!(store.get(session, "k").await.unwrap(), None);
        assert!(!store.exists(session).await.unwrap());

        store.put(session, "k", serde_json::json!(1)).await.unwrap();
        assert!(store.exists(session).await.unwrap());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!store.exists(session).await.unwrap());
    }

    #[test]
    fn lifetime_is_clamped() {
        let store = InMemorySessionStore::new(Duration::MAX);
        assert_eq!(store.lifetime(), MAX_SESSION_LIFETIME);
    }

    #[test]
    fn session_id_parse() {
        let id = SessionId::new();
        assert_eq!(SessionId::parse(&id.to_string()), Some(id));
        assert_eq!(SessionId::parse("not-a-uuid"), None);
    }
}
