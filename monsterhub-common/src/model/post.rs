use crate::model::{
    Id,
    image::ImageData,
    session::Session,
    user::{UserMarker, UserName},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// A stored post.
///
/// `user_name` and `user_avatar` are a snapshot of the author taken when the
/// post was written. Later profile changes do not touch existing posts.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Id<PostMarker>,
    pub user_id: Id<UserMarker>,
    pub user_name: UserName,
    pub user_avatar: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageData>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default)]
    pub likes: Vec<Id<UserMarker>>,
}

impl Post {
    #[must_use]
    pub fn is_owned_by(&self, session: &Session) -> bool {
        self.user_id == session.id
    }

    #[must_use]
    pub fn is_liked_by(&self, user_id: Id<UserMarker>) -> bool {
        self.likes.contains(&user_id)
    }

    /// Adds the liker unless already present. Returns whether the list changed.
    pub fn add_like(&mut self, user_id: Id<UserMarker>) -> bool {
        if self.is_liked_by(user_id) {
            false
        } else {
            self.likes.push(user_id);
            true
        }
    }

    /// Returns whether the list changed.
    pub fn remove_like(&mut self, user_id: Id<UserMarker>) -> bool {
        let before = self.likes.len();
        self.likes.retain(|liker| *liker != user_id);
        self.likes.len() != before
    }
}

/// What the composer submits.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostDraft {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: Option<ImageData>,
}

impl PostDraft {
    /// The trimmed text, or `None` if the draft has neither text nor image.
    #[must_use]
    pub fn normalized_content(&self) -> Option<String> {
        let content = self.content.trim();

        (!content.is_empty() || self.image.is_some()).then(|| content.to_owned())
    }
}
