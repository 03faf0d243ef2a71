//! The post collection.
//!
//! Every operation loads the whole collection, changes it and writes it back.
//! Mutations hold `write_lock` for the full cycle so concurrent requests in
//! this process cannot overwrite each other. Two processes sharing one
//! database still can.

use crate::{
    Result,
    store::{KeyValueStore, POSTS_KEY},
};
use monsterhub_common::model::{
    Id,
    post::{Post, PostDraft, PostMarker},
    session::Session,
    user::UserMarker,
};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum PostFilter {
    #[default]
    All,
    Author(Id<UserMarker>),
}

impl PostFilter {
    fn matches(self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Author(user_id) => post.user_id == user_id,
        }
    }
}

#[derive(Debug)]
pub struct PostStore {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl PostStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// The collection as stored, which is not necessarily sorted. Fails on a
    /// malformed collection so mutations never overwrite it.
    async fn load(&self) -> Result<Vec<Post>> {
        self.store.get_list(POSTS_KEY).await
    }

    /// For reads: a malformed collection shows as no posts.
    async fn load_for_read(&self) -> Result<Vec<Post>> {
        self.store.get_list_or_empty(POSTS_KEY).await
    }

    async fn save(&self, posts: &[Post]) -> Result<()> {
        self.store.put_json(POSTS_KEY, posts).await
    }

    pub async fn create(&self, author: &Session, draft: PostDraft) -> Result<Option<Post>> {
        self.create_at(author, draft, OffsetDateTime::now_utc())
            .await
    }

    /// Like [`create`](Self::create) with an explicit creation time.
    pub async fn create_at(
        &self,
        author: &Session,
        draft: PostDraft,
        timestamp: OffsetDateTime,
    ) -> Result<Option<Post>> {
        let Some(content) = draft.normalized_content() else {
            debug!(user_id = %author.id, "Ignoring post without content or image");
            return Ok(None);
        };

        let post = Post {
            id: Id::generate(),
            user_id: author.id,
            user_name: author.name.clone(),
            user_avatar: author.avatar_or_default().to_owned(),
            content,
            image: draft.image,
            timestamp,
            likes: Vec::new(),
        };

        let _guard = self.write_lock.lock().await;
        let mut posts = self.load().await?;
        posts.insert(0, post.clone());
        self.save(&posts).await?;

        debug!(post_id = %post.id, user_id = %author.id, "Created post");
        Ok(Some(post))
    }

    /// A snapshot of the matching posts, newest first.
    pub async fn list(&self, filter: PostFilter) -> Result<Vec<Post>> {
        let mut posts = self.load_for_read().await?;

        posts.retain(|post| filter.matches(post));
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(posts)
    }

    pub async fn get(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let posts = self.load_for_read().await?;
        Ok(posts.into_iter().find(|post| post.id == post_id))
    }

    /// Applies `change` to the post and persists the collection. Returns
    /// `None` without writing anything if the post does not exist.
    async fn modify<R>(
        &self,
        post_id: Id<PostMarker>,
        change: impl FnOnce(&mut Post) -> R,
    ) -> Result<Option<R>> {
        let _guard = self.write_lock.lock().await;

        let mut posts = self.load().await?;
        let Some(post) = posts.iter_mut().find(|post| post.id == post_id) else {
            debug!(%post_id, "Post not found, skipping write");
            return Ok(None);
        };

        let result = change(post);
        self.save(&posts).await?;

        Ok(Some(result))
    }

    /// Adds `liker` to the likes unless already there. Returns false if the
    /// post does not exist.
    pub async fn like(&self, post_id: Id<PostMarker>, liker: Id<UserMarker>) -> Result<bool> {
        let result = self.modify(post_id, |post| post.add_like(liker)).await?;
        Ok(result.is_some())
    }

    /// Returns false if the post does not exist.
    pub async fn unlike(&self, post_id: Id<PostMarker>, liker: Id<UserMarker>) -> Result<bool> {
        let result = self.modify(post_id, |post| post.remove_like(liker)).await?;
        Ok(result.is_some())
    }

    /// Flips whether `liker` likes the post and returns the post afterwards.
    pub async fn toggle_like(
        &self,
        post_id: Id<PostMarker>,
        liker: Id<UserMarker>,
    ) -> Result<Option<Post>> {
        self.modify(post_id, |post| {
            if !post.remove_like(liker) {
                post.add_like(liker);
            }
            post.clone()
        })
        .await
    }

    /// Replaces the text of a post. Blank content is ignored.
    pub async fn update(&self, post_id: Id<PostMarker>, content: &str) -> Result<bool> {
        let content = content.trim();
        if content.is_empty() {
            debug!(%post_id, "Ignoring edit with blank content");
            return Ok(false);
        }

        let result = self
            .modify(post_id, |post| post.content = content.to_owned())
            .await?;
        Ok(result.is_some())
    }

    /// Returns whether a post was removed. Deleting a missing post is a no-op.
    pub async fn delete(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut posts = self.load().await?;
        let before = posts.len();
        posts.retain(|post| post.id != post_id);

        if posts.len() == before {
            return Ok(false);
        }

        self.save(&posts).await?;
        debug!(%post_id, "Deleted post");
        Ok(true)
    }
}
