//! Extractors for the process-wide session.
//!
//! There are no per-request credentials. Whoever signed in last is the
//! session for every request, the same way a single browser tab has one
//! current user.

use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use monsterhub_common::model::session::Session;
use monsterhub_db::auth::AuthService;
use std::sync::Arc;

fn restored_auth<S>(state: &S) -> Result<Arc<AuthService>, ServerError>
where
    Arc<AuthService>: FromRef<S>,
{
    let auth = Arc::<AuthService>::from_ref(state);

    if auth.is_loading() {
        Err(ServerError::Loading)
    } else {
        Ok(auth)
    }
}

/// The current session, if any.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Viewer(pub Option<Session>);

impl<S> FromRequestParts<S> for Viewer
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(restored_auth(state)?.current()))
    }
}

/// The current session. Rejects the request if nobody is signed in.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SignedIn(pub Session);

impl<S> FromRequestParts<S> for SignedIn
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        restored_auth(state)?
            .current()
            .map(Self)
            .ok_or(ServerError::NotSignedIn)
    }
}
