use crate::{server::ServerError, service::Viewer};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use time::UtcDateTime;
use yatube_common::model::auth::AuthToken;
use yatube_db::Store;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// Requests without an `Authorization` header are anonymous. A header carrying anything but a
/// live token is rejected.
impl<S> FromRequestParts<S> for Viewer
where
    Arc<dyn Store>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = match AuthorizationHeader::from_request_parts(parts, state).await {
            Ok(header) => header,
            Err(rejection) if rejection.is_missing() => return Ok(Viewer::Anonymous),
            Err(rejection) => return Err(ServerError::InvalidAuthorizationHeader(rejection)),
        };

        let request_token: AuthToken = header.token().parse()?;
        let token_hash = request_token.hash()?;

        let store = Arc::<dyn Store>::from_ref(state);
        let authentication = store
            .fetch_auth(&token_hash)
            .await?
            .ok_or(ServerError::InvalidToken)?;

        if authentication.user != request_token.user_id
            || authentication.is_expired_at(UtcDateTime::now())
        {
            return Err(ServerError::InvalidToken);
        }

        let user = store
            .fetch_user(authentication.user)
            .await?
            .ok_or(ServerError::InvalidToken)?;

        Ok(Viewer::Authenticated(user))
    }
}

/// A [`Viewer`] that is logged in. Listed first in a handler, it turns anonymous requests away
/// before the path or body are looked at.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct LoggedIn(pub Viewer);

impl<S> FromRequestParts<S> for LoggedIn
where
    Arc<dyn Store>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let viewer = Viewer::from_request_parts(parts, state).await?;
        viewer.require()?;

        Ok(Self(viewer))
    }
}
