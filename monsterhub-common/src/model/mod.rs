pub mod image;
pub mod post;
pub mod session;
pub mod user;

use crate::model::user::{InvalidEmailError, InvalidUserNameError};
use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

/// Placeholder shown for users that never uploaded an avatar.
pub const DEFAULT_AVATAR: &str = "https://images.unsplash.com/photo-1535268647677-300dbf3d78d1?w=400&h=400&fit=crop&crop=face";

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    UserName(#[from] InvalidUserNameError),
    #[error(transparent)]
    Email(#[from] InvalidEmailError),
}

/// A random 128 bit identifier, typed by the kind of object it names.
///
/// Ids carry no ordering meaning beyond being distinct. Anything that needs a
/// chronological order sorts by timestamp instead.
#[derive_where(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<Marker>(Uuid, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value), PhantomData)
    }

    #[must_use]
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4())
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> FromStr for Id<Marker> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::new)
    }
}

impl<Marker> From<Uuid> for Id<Marker> {
    fn from(value: Uuid) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for Uuid {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, post::PostMarker, user::UserMarker};

    #[test]
    fn generated_ids_are_distinct() {
        let first = Id::<PostMarker>::generate();
        let second = Id::<PostMarker>::generate();

        assert_ne!(first, second);
    }

    #[test]
    fn id_string_forms() {
        let id = Id::<UserMarker>::from_u128(1);

        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000001");
        assert_eq!(
            "00000000-0000-0000-0000-000000000001"
                .parse::<Id<UserMarker>>()
                .unwrap(),
            id
        );
        assert!("1".parse::<Id<UserMarker>>().is_err());

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000001\"");
        assert_eq!(serde_json::from_str::<Id<UserMarker>>(&json).unwrap(), id);
    }
}
