//! Registered users.

use crate::{
    Result,
    store::{KeyValueStore, REGISTERED_USERS_KEY},
};
use monsterhub_common::model::{
    Id,
    user::{Email, User, UserMarker},
};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct Registry {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl Registry {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Users in registration order. A malformed registry reads as empty.
    pub async fn all(&self) -> Result<Vec<User>> {
        self.store.get_list_or_empty(REGISTERED_USERS_KEY).await
    }

    async fn load(&self) -> Result<Vec<User>> {
        self.store.get_list(REGISTERED_USERS_KEY).await
    }

    pub async fn find(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let users = self.all().await?;
        Ok(users.into_iter().find(|user| user.id == user_id))
    }

    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>> {
        let users = self.all().await?;
        Ok(users.into_iter().find(|user| user.email == *email))
    }

    /// Appends the user unless the email is already registered. Returns
    /// whether the user was added.
    pub async fn insert(&self, user: User) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.load().await?;
        if users.iter().any(|existing| existing.email == user.email) {
            return Ok(false);
        }

        users.push(user);
        self.store.put_json(REGISTERED_USERS_KEY, &users).await?;

        Ok(true)
    }

    /// Returns false if no such user is registered.
    pub async fn set_avatar(&self, user_id: Id<UserMarker>, avatar: String) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.load().await?;
        let Some(user) = users.iter_mut().find(|user| user.id == user_id) else {
            return Ok(false);
        };

        user.avatar = Some(avatar);
        self.store.put_json(REGISTERED_USERS_KEY, &users).await?;

        Ok(true)
    }
}
