//! Read-side views over the post collection.
//!
//! Nothing here is cached. Callers run a projection again after every
//! mutation to see its effect.

use crate::{
    Result,
    posts::{PostFilter, PostStore},
};
use monsterhub_common::model::{post::Post, session::Session};
use serde::Serialize;

/// Everything on the profile page: who is signed in and what they posted.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user: Session,
    pub avatar: String,
    pub post_count: usize,
    pub posts: Vec<Post>,
}

/// Every post, newest first.
pub async fn feed(posts: &PostStore) -> Result<Vec<Post>> {
    posts.list(PostFilter::All).await
}

pub async fn profile(posts: &PostStore, session: &Session) -> Result<Profile> {
    let own_posts = posts.list(PostFilter::Author(session.id)).await?;

    Ok(Profile {
        user: session.clone(),
        avatar: session.avatar_or_default().to_owned(),
        post_count: own_posts.len(),
        posts: own_posts,
    })
}

/// Only the author may edit or delete a post.
#[must_use]
pub fn can_modify(session: Option<&Session>, post: &Post) -> bool {
    session.is_some_and(|session| post.is_owned_by(session))
}
