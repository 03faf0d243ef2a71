//! Sign-in, registration and the profile avatar.
//!
//! Rejections (unknown credentials, taken email, invalid input) are not
//! errors: they come back as `Ok(None)` and are logged. `Err` is reserved for
//! storage and hashing failures.

use crate::{
    Result,
    registry::Registry,
    session::SessionStore,
    store::KeyValueStore,
};
use monsterhub_common::{
    model::{
        DEFAULT_AVATAR, Id,
        image::ImageData,
        session::Session,
        user::{Email, User, UserName},
    },
    password::PasswordHasher,
};
use std::sync::{
    Arc, LazyLock,
    atomic::{AtomicBool, Ordering},
};
use tracing::{debug, info};

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "password";
pub const DEMO_NAME: &str = "Demo User";

static DEMO_SESSION: LazyLock<Session> = LazyLock::new(|| Session {
    id: Id::from_u128(1),
    name: UserName::new(DEMO_NAME).expect("Demo user name is invalid."),
    email: Email::new(DEMO_EMAIL).expect("Demo email is invalid."),
    avatar: Some(DEFAULT_AVATAR.to_owned()),
});

/// The built-in account that exists without registration.
#[must_use]
pub fn demo_session() -> Session {
    DEMO_SESSION.clone()
}

#[derive(Debug)]
pub struct AuthService {
    registry: Registry,
    sessions: SessionStore,
    hasher: PasswordHasher,
    loading: AtomicBool,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, hasher: PasswordHasher) -> Self {
        Self {
            registry: Registry::new(Arc::clone(&store)),
            sessions: SessionStore::new(store),
            hasher,
            loading: AtomicBool::new(true),
        }
    }

    /// True until [`initialize`](Self::initialize) has finished.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Restores the persisted session. Runs once at startup.
    pub async fn initialize(&self) -> Result<Option<Session>> {
        let restored = self.sessions.restore().await;
        self.loading.store(false, Ordering::Release);

        let restored = restored?;
        match &restored {
            Some(session) => info!(user_id = %session.id, "Session restored"),
            None => info!("Starting signed out"),
        }
        Ok(restored)
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.sessions.current()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Option<Session>> {
        if email == DEMO_EMAIL && password == DEMO_PASSWORD {
            let session = self.sessions.start(demo_session()).await?;
            info!(user_id = %session.id, "Demo user logged in");
            return Ok(Some(session));
        }

        let users = self.registry.all().await?;
        let Some(user) = users
            .iter()
            .find(|user| user.email.get() == email && user.password_hash.verify(password))
        else {
            debug!("Login rejected");
            return Ok(None);
        };

        let session = self.sessions.start(Session::from(user)).await?;
        info!(user_id = %session.id, "User logged in");
        Ok(Some(session))
    }

    /// Registers a new user and signs them in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>> {
        let name = match UserName::new(name) {
            Ok(name) => name,
            Err(err) => {
                debug!(error = %err, "Registration rejected");
                return Ok(None);
            }
        };
        let email = match Email::new(email) {
            Ok(email) => email,
            Err(err) => {
                debug!(error = %err, "Registration rejected");
                return Ok(None);
            }
        };

        if self.registry.find_by_email(&email).await?.is_some() {
            debug!("Registration rejected, email already registered");
            return Ok(None);
        }

        let user = User {
            id: Id::generate(),
            name,
            email,
            password_hash: self.hasher.hash(password)?,
            avatar: Some(DEFAULT_AVATAR.to_owned()),
        };
        let session = Session::from(&user);

        if !self.registry.insert(user).await? {
            debug!("Registration rejected, email already registered");
            return Ok(None);
        }

        let session = self.sessions.start(session).await?;
        info!(user_id = %session.id, "User registered");
        Ok(Some(session))
    }

    pub async fn logout(&self) -> Result<()> {
        if let Some(session) = self.sessions.current() {
            info!(user_id = %session.id, "User logged out");
        }
        self.sessions.clear().await
    }

    /// Sets the signed-in user's avatar. Posts written before keep the
    /// avatar they were created with.
    pub async fn update_avatar(&self, image: ImageData) -> Result<Option<Session>> {
        let Some(session) = self.sessions.current() else {
            debug!("Avatar update without session");
            return Ok(None);
        };

        let avatar = image.into_inner();
        if !self.registry.set_avatar(session.id, avatar.clone()).await? {
            debug!(user_id = %session.id, "User is not registered, only updating the session");
        }

        let updated = self
            .sessions
            .update(session.id, |session| session.avatar = Some(avatar))
            .await?;
        if updated.is_some() {
            info!(user_id = %session.id, "Avatar updated");
        }
        Ok(updated)
    }
}
