use crate::model::{
    DEFAULT_AVATAR, Id,
    user::{Email, User, UserMarker, UserName},
};
use base64::{DecodeError, Engine, display::Base64Display, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

pub const SESSION_TOKEN_CORE_LEN: usize = 24;

/// The signed-in identity: a [`User`] without its password hash.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Id<UserMarker>,
    pub name: UserName,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Session {
    #[must_use]
    pub fn avatar_or_default(&self) -> &str {
        self.avatar.as_deref().unwrap_or(DEFAULT_AVATAR)
    }
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum SessionTokenDecodeError {
    #[error("Not enough parts separated by ':'")]
    NotEnoughParts,
    #[error("Invalid user id: {0}")]
    InvalidUserId(uuid::Error),
    #[error("Decoding base64 failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("The length of the core part is incorrect")]
    InvalidCoreLength,
}

/// Opaque token persisted next to the session.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SessionToken {
    pub user_id: Id<UserMarker>,
    pub core: [u8; SESSION_TOKEN_CORE_LEN],
}

impl SessionToken {
    #[must_use]
    pub fn generate_random(user_id: Id<UserMarker>) -> Self {
        Self {
            user_id,
            core: rand::random(),
        }
    }

    #[must_use]
    pub fn as_token_str(&self) -> String {
        let user_id = self.user_id;
        let encoded_core = Base64Display::new(&self.core, &BASE64_STANDARD);

        format!("{user_id}:{encoded_core}")
    }
}

impl FromStr for SessionToken {
    type Err = SessionTokenDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user_id_part, core_part) = s.split_once(':').ok_or(Self::Err::NotEnoughParts)?;

        let user_id = user_id_part.parse().map_err(Self::Err::InvalidUserId)?;
        let core = BASE64_STANDARD
            .decode(core_part)?
            .try_into()
            .map_err(|_| Self::Err::InvalidCoreLength)?;

        Ok(Self { user_id, core })
    }
}

impl Display for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_token_str())
    }
}

impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("user_id", &self.user_id)
            .field("core", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        session::{SessionToken, SessionTokenDecodeError},
        user::UserMarker,
    };

    #[test]
    fn token_string_parses_back() {
        let token = SessionToken::generate_random(Id::generate());
        let parsed: SessionToken = token.as_token_str().parse().unwrap();

        assert_eq!(parsed, token);
        assert_ne!(SessionToken::generate_random(token.user_id), token);
    }

    #[test]
    fn malformed_tokens() {
        assert_eq!(
            "demo-token".parse::<SessionToken>(),
            Err(SessionTokenDecodeError::NotEnoughParts)
        );
        assert!(matches!(
            "1:AAAA".parse::<SessionToken>(),
            Err(SessionTokenDecodeError::InvalidUserId(_))
        ));

        let user_id = Id::<UserMarker>::generate();
        assert!(matches!(
            format!("{user_id}:***").parse::<SessionToken>(),
            Err(SessionTokenDecodeError::Decode(_))
        ));
        assert_eq!(
            format!("{user_id}:AAAA").parse::<SessionToken>(),
            Err(SessionTokenDecodeError::InvalidCoreLength)
        );
    }

    #[test]
    fn debug_redacts_core() {
        let token = SessionToken::generate_random(Id::generate());

        assert!(format!("{token:?}").contains("[redacted]"));
        assert!(!format!("{token:?}").contains(&token.as_token_str()));
    }
}
