//! JSON in and out.
//!
//! Every page is a snapshot of the store taken for that request, so replies
//! are marked `no-store` and a client never shows a feed that a later
//! mutation has already changed.

use crate::server::ServerError;
use axum::{
    Json as AxumJson,
    extract::FromRequest,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::{CacheControl, ContentType};
use serde::Serialize;

#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(AxumJson), rejection(ServerError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(json) => (
                TypedHeader(ContentType::json()),
                TypedHeader(CacheControl::new().with_no_store()),
                json,
            )
                .into_response(),
            Err(err) => ServerError::JsonResponse(err).into_response(),
        }
    }
}

/// A `201 Created` reply carrying the new object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.0).into_response();
        if response.status().is_success() {
            *response.status_mut() = StatusCode::CREATED;
        }
        response
    }
}
