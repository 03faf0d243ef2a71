//! The current signed-in identity and its persisted mirror.

use crate::{
    Result,
    store::{KeyValueStore, TOKEN_KEY, USER_KEY},
};
use monsterhub_common::model::{
    Id,
    session::{Session, SessionToken},
    user::UserMarker,
};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// The one session of this process, shared by every request.
///
/// Writes go to `token`, then `user`, then memory. `write_lock` is held for
/// the whole sequence so the persisted token, the persisted user and the
/// in-memory session always name the same user.
#[derive(Debug)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Session>>,
    write_lock: Mutex<()>,
}

impl SessionStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_current(&self, session: Option<Session>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Loads the persisted session into memory.
    ///
    /// A session is only restored if both the token and the user are
    /// present. If either of them cannot be parsed, both keys are removed and
    /// nobody is signed in.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let _guard = self.write_lock.lock().await;

        let token = self.store.get(TOKEN_KEY).await?;
        let user = self.store.get(USER_KEY).await?;

        let (Some(token), Some(user)) = (token, user) else {
            debug!("No persisted session");
            self.set_current(None);
            return Ok(None);
        };

        let parsed = token
            .parse::<SessionToken>()
            .map_err(|err| err.to_string())
            .and_then(|token| {
                serde_json::from_str::<Session>(&user)
                    .map(|session| (token, session))
                    .map_err(|err| err.to_string())
            });

        match parsed {
            Ok((token, session)) if token.user_id == session.id => {
                debug!(user_id = %session.id, "Restored persisted session");
                self.set_current(Some(session.clone()));
                Ok(Some(session))
            }
            Ok((token, session)) => {
                warn!(
                    token_user_id = %token.user_id,
                    session_user_id = %session.id,
                    "Persisted token belongs to another user, clearing session"
                );
                self.clear_locked().await?;
                Ok(None)
            }
            Err(error) => {
                warn!(%error, "Persisted session is malformed, clearing it");
                self.clear_locked().await?;
                Ok(None)
            }
        }
    }

    /// Persists a fresh token and the session, then makes it current.
    pub async fn start(&self, session: Session) -> Result<Session> {
        let _guard = self.write_lock.lock().await;
        let token = SessionToken::generate_random(session.id);

        self.store.put(TOKEN_KEY, &token.as_token_str()).await?;
        self.store.put_json(USER_KEY, &session).await?;
        self.set_current(Some(session.clone()));

        Ok(session)
    }

    /// Applies `change` to the current session and persists it, keeping the
    /// token. Does nothing unless `user_id` is the one signed in.
    pub async fn update(
        &self,
        user_id: Id<UserMarker>,
        change: impl FnOnce(&mut Session),
    ) -> Result<Option<Session>> {
        let _guard = self.write_lock.lock().await;

        let Some(mut session) = self.current().filter(|session| session.id == user_id) else {
            debug!(%user_id, "Session changed hands, not updating it");
            return Ok(None);
        };

        change(&mut session);
        self.store.put_json(USER_KEY, &session).await?;
        self.set_current(Some(session.clone()));

        Ok(Some(session))
    }

    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.clear_locked().await
    }

    async fn clear_locked(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY).await?;
        self.store.remove(USER_KEY).await?;
        self.set_current(None);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Result,
        session::SessionStore,
        store::{KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY},
    };
    use async_trait::async_trait;
    use monsterhub_common::model::{
        Id,
        session::{Session, SessionToken},
        user::{Email, UserName},
    };
    use std::sync::Arc;

    fn session(name: &str, email: &str) -> Session {
        Session {
            id: Id::generate(),
            name: UserName::new(name).unwrap(),
            email: Email::new(email).unwrap(),
            avatar: None,
        }
    }

    fn alice() -> Session {
        session("Alice", "a@x.com")
    }

    async fn persisted_token(store: &Arc<dyn KeyValueStore>) -> Option<SessionToken> {
        let raw = store.get(TOKEN_KEY).await.unwrap()?;
        Some(raw.parse().unwrap())
    }

    /// Hands control back to the scheduler before every access, so
    /// concurrent writers interleave between keys.
    #[derive(Debug, Default)]
    struct YieldingStore(MemoryStore);

    #[async_trait]
    impl KeyValueStore for YieldingStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            tokio::task::yield_now().await;
            self.0.get(key).await
        }

        async fn put(&self, key: &str, value: &str) -> Result<()> {
            tokio::task::yield_now().await;
            self.0.put(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            tokio::task::yield_now().await;
            self.0.remove(key).await
        }

        async fn keys(&self) -> Result<Vec<String>> {
            tokio::task::yield_now().await;
            self.0.keys().await
        }
    }

    fn stores() -> (Arc<dyn KeyValueStore>, SessionStore) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        (store.clone(), SessionStore::new(store))
    }

    #[tokio::test]
    async fn start_persists_and_restore_reads_back() {
        let (store, sessions) = stores();
        let alice = alice();

        sessions.start(alice.clone()).await.unwrap();
        assert_eq!(sessions.current(), Some(alice.clone()));
        assert_eq!(persisted_token(&store).await.unwrap().user_id, alice.id);

        let reloaded = SessionStore::new(store);
        assert_eq!(reloaded.current(), None);
        assert_eq!(reloaded.restore().await.unwrap(), Some(alice.clone()));
        assert_eq!(reloaded.current(), Some(alice));
    }

    #[tokio::test]
    async fn persisted_user_has_no_password_material() {
        let (store, sessions) = stores();
        sessions.start(alice()).await.unwrap();

        let raw = store.get(USER_KEY).await.unwrap().unwrap();
        assert!(!raw.contains("password"));
        assert!(raw.contains("\"email\":\"a@x.com\""));
    }

    #[tokio::test]
    async fn malformed_user_is_cleared() {
        let (store, sessions) = stores();
        let token = SessionToken::generate_random(Id::generate());
        store.put(TOKEN_KEY, &token.as_token_str()).await.unwrap();
        store.put(USER_KEY, "{not json").await.unwrap();

        assert_eq!(sessions.restore().await.unwrap(), None);
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(store.get(USER_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_token_is_cleared() {
        let (store, sessions) = stores();
        store.put(TOKEN_KEY, "demo-token").await.unwrap();
        store.put_json(USER_KEY, &alice()).await.unwrap();

        assert_eq!(sessions.restore().await.unwrap(), None);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn token_for_another_user_is_cleared() {
        let (store, sessions) = stores();
        let token = SessionToken::generate_random(Id::generate());
        store.put(TOKEN_KEY, &token.as_token_str()).await.unwrap();
        store.put_json(USER_KEY, &alice()).await.unwrap();

        assert_eq!(sessions.restore().await.unwrap(), None);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn half_a_session_is_no_session() {
        let (store, sessions) = stores();
        store.put_json(USER_KEY, &alice()).await.unwrap();

        assert_eq!(sessions.restore().await.unwrap(), None);
        assert_eq!(sessions.current(), None);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let (store, sessions) = stores();
        sessions.start(alice()).await.unwrap();

        sessions.clear().await.unwrap();
        assert_eq!(sessions.current(), None);
        assert_eq!(persisted_token(&store).await, None);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_starts_leave_one_consistent_session() {
        let store: Arc<dyn KeyValueStore> = Arc::new(YieldingStore::default());
        let sessions = SessionStore::new(Arc::clone(&store));
        let alice = alice();
        let bob = session("Bob", "b@x.com");

        let (started_alice, started_bob) =
            tokio::join!(sessions.start(alice.clone()), sessions.start(bob.clone()));
        started_alice.unwrap();
        started_bob.unwrap();

        let current = sessions.current().unwrap();
        assert!(current == alice || current == bob);
        assert_eq!(persisted_token(&store).await.unwrap().user_id, current.id);
        let persisted: Session = store.get_json(USER_KEY).await.unwrap().unwrap();
        assert_eq!(persisted, current);

        let restarted = SessionStore::new(store);
        assert_eq!(restarted.restore().await.unwrap(), Some(current));
    }

    #[tokio::test]
    async fn update_keeps_token_and_only_touches_the_named_user() {
        let (store, sessions) = stores();
        let alice = alice();
        sessions.start(alice.clone()).await.unwrap();
        let token = persisted_token(&store).await.unwrap();

        let updated = sessions
            .update(alice.id, |session| session.avatar = Some("new".to_owned()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.avatar.as_deref(), Some("new"));
        assert_eq!(sessions.current(), Some(updated.clone()));
        assert_eq!(persisted_token(&store).await, Some(token));

        let stranger = Id::generate();
        let ignored = sessions
            .update(stranger, |session| session.avatar = None)
            .await
            .unwrap();
        assert_eq!(ignored, None);
        assert_eq!(sessions.current(), Some(updated));
    }
}
