use crate::{Result, store::KeyValueStore};
use async_trait::async_trait;
use sqlx::{
    SqlitePool, query, query_scalar,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;

/// A [`KeyValueStore`] persisted in a single SQLite table.
///
/// The pool holds exactly one connection that is never recycled, which keeps
/// `sqlite::memory:` databases alive for the lifetime of the store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        query(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )
            ",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = query_scalar::<_, String>(
            "
            SELECT value
            FROM kv
            WHERE key = ?
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        query(
            "
            INSERT INTO kv (key, value)
            VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let keys = query_scalar::<_, String>("SELECT key FROM kv ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use crate::store::{KeyValueStore, SqliteStore};

    #[tokio::test]
    async fn put_get_remove() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();

        assert_eq!(store.get("posts").await.unwrap(), None);

        store.put("posts", "[]").await.unwrap();
        store.put("posts", "[1]").await.unwrap();
        store.put("token", "t").await.unwrap();
        assert_eq!(store.get("posts").await.unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.keys().await.unwrap(), ["posts", "token"]);

        store.remove("posts").await.unwrap();
        store.remove("posts").await.unwrap();
        assert_eq!(store.get("posts").await.unwrap(), None);
        assert_eq!(store.keys().await.unwrap(), ["token"]);
    }
}
