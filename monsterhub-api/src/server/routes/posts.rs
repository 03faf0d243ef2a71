use crate::server::{
    Result, ServerError, ServerRouter,
    auth::SignedIn,
    json::{Created, Json},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use monsterhub_common::model::{
    Id,
    image::ImageData,
    post::{Post, PostDraft, PostMarker},
};
use monsterhub_db::{posts::PostStore, projection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_post)
        .typed_patch(update_post)
        .typed_delete(delete_post)
        .typed_put(like_post)
        .typed_delete(unlike_post)
        .typed_post(toggle_like)
}

#[derive(TypedPath)]
#[typed_path("/posts")]
struct PostsPath;

#[derive(Clone, Deserialize)]
struct CreatePostRequest {
    #[serde(default)]
    content: String,
    #[serde(default)]
    image: Option<String>,
}

async fn create_post(
    _: PostsPath,
    State(posts): State<Arc<PostStore>>,
    SignedIn(session): SignedIn,
    Json(request): Json<CreatePostRequest>,
) -> Result<Created<Post>> {
    let draft = PostDraft {
        content: request.content,
        image: request.image.map(ImageData::new).transpose()?,
    };

    let post = posts
        .create(&session, draft)
        .await?
        .ok_or(ServerError::EmptyPost)?;

    Ok(Created(post))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

/// Fails if the post exists and belongs to someone else. Missing posts pass,
/// the store treats them as a no-op.
async fn ensure_owner(posts: &PostStore, id: Id<PostMarker>, session: &SignedIn) -> Result<()> {
    match posts.get(id).await? {
        Some(post) if !projection::can_modify(Some(&session.0), &post) => {
            Err(ServerError::NotPostOwner(id))
        }
        _ => Ok(()),
    }
}

#[derive(Clone, Deserialize)]
struct UpdatePostRequest {
    content: String,
}

async fn update_post(
    PostPath { id }: PostPath,
    State(posts): State<Arc<PostStore>>,
    session: SignedIn,
    Json(request): Json<UpdatePostRequest>,
) -> Result<StatusCode> {
    ensure_owner(&posts, id, &session).await?;
    posts.update(id, &request.content).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(posts): State<Arc<PostStore>>,
    session: SignedIn,
) -> Result<StatusCode> {
    ensure_owner(&posts, id, &session).await?;
    posts.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/like", rejection(ServerError))]
struct LikePath {
    id: Id<PostMarker>,
}

async fn like_post(
    LikePath { id }: LikePath,
    State(posts): State<Arc<PostStore>>,
    SignedIn(session): SignedIn,
) -> Result<StatusCode> {
    posts.like(id, session.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn unlike_post(
    LikePath { id }: LikePath,
    State(posts): State<Arc<PostStore>>,
    SignedIn(session): SignedIn,
) -> Result<StatusCode> {
    posts.unlike(id, session.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
struct LikeState {
    liked: bool,
    likes: usize,
}

async fn toggle_like(
    LikePath { id }: LikePath,
    State(posts): State<Arc<PostStore>>,
    SignedIn(session): SignedIn,
) -> Result<Json<LikeState>> {
    let state = match posts.toggle_like(id, session.id).await? {
        Some(post) => LikeState {
            liked: post.is_liked_by(session.id),
            likes: post.likes.len(),
        },
        None => LikeState {
            liked: false,
            likes: 0,
        },
    };

    Ok(Json(state))
}
