use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{SignedIn, Viewer},
    json::{Created, Json},
    routes::pages::HomePath,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use monsterhub_common::model::{
    ModelValidationError,
    image::ImageData,
    session::Session,
    user::{Email, UserName},
};
use monsterhub_db::auth::{AuthService, DEMO_EMAIL, DEMO_PASSWORD};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(login_page)
        .typed_post(login)
        .typed_get(register_page)
        .typed_post(register)
        .typed_post(logout)
        .typed_put(update_avatar)
}

/// Signed-in users have no business on the login and register pages.
fn redirect_signed_in(viewer: Option<&Session>) -> Option<Response> {
    viewer.map(|_| Redirect::to(HomePath::PATH).into_response())
}

#[derive(TypedPath)]
#[typed_path("/login")]
pub(super) struct LoginPath;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginPage {
    demo_email: &'static str,
    demo_password: &'static str,
}

async fn login_page(_: LoginPath, Viewer(viewer): Viewer) -> Response {
    redirect_signed_in(viewer.as_ref()).unwrap_or_else(|| {
        Json(LoginPage {
            demo_email: DEMO_EMAIL,
            demo_password: DEMO_PASSWORD,
        })
        .into_response()
    })
}

#[derive(Clone, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    _: LoginPath,
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>> {
    let session = auth
        .login(&request.email, &request.password)
        .await?
        .ok_or(ServerError::InvalidCredentials)?;

    Ok(Json(session))
}

#[derive(TypedPath)]
#[typed_path("/register")]
struct RegisterPath;

#[derive(Clone, Debug, Serialize)]
struct RegisterPage {}

async fn register_page(_: RegisterPath, Viewer(viewer): Viewer) -> Response {
    redirect_signed_in(viewer.as_ref()).unwrap_or_else(|| Json(RegisterPage {}).into_response())
}

#[derive(Clone, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

async fn register(
    _: RegisterPath,
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Created<Session>> {
    UserName::new(&request.name).map_err(ModelValidationError::from)?;
    Email::new(&request.email).map_err(ModelValidationError::from)?;

    let session = auth
        .register(&request.name, &request.email, &request.password)
        .await?
        .ok_or(ServerError::EmailTaken)?;

    Ok(Created(session))
}

#[derive(TypedPath)]
#[typed_path("/logout")]
struct LogoutPath;

async fn logout(_: LogoutPath, State(auth): State<Arc<AuthService>>) -> Result<StatusCode> {
    auth.logout().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath)]
#[typed_path("/profile/avatar")]
struct AvatarPath;

#[derive(Clone, Deserialize)]
struct AvatarRequest {
    avatar: String,
}

async fn update_avatar(
    _: AvatarPath,
    State(auth): State<Arc<AuthService>>,
    SignedIn(_): SignedIn,
    Json(request): Json<AvatarRequest>,
) -> Result<Json<Session>> {
    let image = ImageData::new(request.avatar)?;

    let session = auth
        .update_avatar(image)
        .await?
        .ok_or(ServerError::NotSignedIn)?;

    Ok(Json(session))
}
