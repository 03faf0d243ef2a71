use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use json::Json;
use monsterhub_common::model::{
    Id, ModelValidationError, image::InvalidImageDataError, post::PostMarker,
};
use monsterhub_db::{DbError, auth::AuthService, posts::PostStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

mod auth;
mod json;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
    pub posts: Arc<PostStore>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("The session is still being restored")]
    Loading,
    #[error("Nobody is signed in")]
    NotSignedIn,
    #[error("Email or password is incorrect")]
    InvalidCredentials,
    #[error("The email address is already registered")]
    EmailTaken,
    #[error(transparent)]
    InvalidInput(#[from] ModelValidationError),
    #[error("The image was rejected: {0}")]
    InvalidImage(#[from] InvalidImageDataError),
    #[error("A post needs text or an image")]
    EmptyPost,
    #[error("Post with id {0} belongs to somebody else.")]
    NotPostOwner(Id<PostMarker>),
    #[error(transparent)]
    Database(#[from] DbError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) | ServerError::PathRejection(_) => StatusCode::NOT_FOUND,
            ServerError::NotSignedIn | ServerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServerError::NotPostOwner(_) => StatusCode::FORBIDDEN,
            ServerError::EmailTaken => StatusCode::CONFLICT,
            ServerError::JsonRejection(_)
            | ServerError::InvalidInput(_)
            | ServerError::InvalidImage(_)
            | ServerError::EmptyPost => StatusCode::BAD_REQUEST,
            ServerError::Loading => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::JsonResponse(_) | ServerError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
        } else {
            warn!(error = %self, %status, "Rejecting request");
        }

        let error_response = ErrorResponse {
            status: status.as_u16(),
        };
        (status, Json(error_response)).into_response()
    }
}
