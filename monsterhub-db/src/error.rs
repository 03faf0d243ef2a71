use monsterhub_common::password::PasswordHashError;
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Value stored under {key:?} is malformed: {source}")]
    MalformedValue {
        key: &'static str,
        source: serde_json::Error,
    },
    #[error("Value for {key:?} could not be serialized: {source}")]
    Serialize {
        key: &'static str,
        source: serde_json::Error,
    },
    #[error(transparent)]
    PasswordHash(#[from] PasswordHashError),
}
