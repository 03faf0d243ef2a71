//! The key-value storage every service is built on.
//!
//! The services never talk to a concrete backend. They get an
//! `Arc<dyn KeyValueStore>` injected, which is a [`SqliteStore`] in the
//! running server and a [`MemoryStore`] in tests.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::{DbError, Result};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use tracing::warn;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const REGISTERED_USERS_KEY: &str = "registeredUsers";
pub const POSTS_KEY: &str = "posts";

/// A flat string-to-string map.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Inserts or overwrites.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently present, sorted.
    async fn keys(&self) -> Result<Vec<String>>;
}

impl dyn KeyValueStore {
    pub async fn get_json<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>> {
        let Some(raw) = self.get(key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| DbError::MalformedValue { key, source })
    }

    pub async fn put_json<T>(&self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let raw =
            serde_json::to_string(value).map_err(|source| DbError::Serialize { key, source })?;

        self.put(key, &raw).await
    }

    /// Like [`get_json`](Self::get_json), with a missing key read as an empty list.
    pub async fn get_list<T: DeserializeOwned>(&self, key: &'static str) -> Result<Vec<T>> {
        Ok(self.get_json(key).await?.unwrap_or_default())
    }

    /// Like [`get_list`](Self::get_list), but a malformed value is logged and
    /// read as an empty list. The stored value is left untouched.
    pub async fn get_list_or_empty<T: DeserializeOwned>(
        &self,
        key: &'static str,
    ) -> Result<Vec<T>> {
        match self.get_list(key).await {
            Err(DbError::MalformedValue { key, source }) => {
                warn!(key, error = %source, "Stored value is malformed, reading it as empty");
                Ok(Vec::new())
            }
            result => result,
        }
    }
}
