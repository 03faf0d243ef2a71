use crate::server::{
    Result, ServerRouter,
    auth::Viewer,
    json::Json,
    routes::account::LoginPath,
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use monsterhub_common::model::{post::Post, session::Session};
use monsterhub_db::{posts::PostStore, projection};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(index)
        .typed_get(feed)
        .typed_get(home)
}

#[derive(TypedPath)]
#[typed_path("/")]
struct IndexPath;

async fn index(_: IndexPath) -> Redirect {
    Redirect::to(FeedPath::PATH)
}

#[derive(TypedPath)]
#[typed_path("/feed")]
pub(super) struct FeedPath;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedPage {
    viewer: Option<Session>,
    can_post: bool,
    posts: Vec<Post>,
}

async fn feed(
    _: FeedPath,
    State(posts): State<Arc<PostStore>>,
    Viewer(viewer): Viewer,
) -> Result<Json<FeedPage>> {
    let posts = projection::feed(&posts).await?;

    Ok(Json(FeedPage {
        can_post: viewer.is_some(),
        viewer,
        posts,
    }))
}

#[derive(TypedPath)]
#[typed_path("/home")]
pub(super) struct HomePath;

async fn home(
    _: HomePath,
    State(posts): State<Arc<PostStore>>,
    Viewer(viewer): Viewer,
) -> Result<Response> {
    let Some(session) = viewer else {
        return Ok(Redirect::to(LoginPath::PATH).into_response());
    };

    let profile = projection::profile(&posts, &session).await?;
    Ok(Json(profile).into_response())
}
