use crate::{
    server::{
        Result, ServerError, ServerRouter,
        auth::LoggedIn,
        json::Json,
        query::{PageQuery, Query},
    },
    service::{
        Viewer,
        feed::{Profile, get_profile},
        follow::{follow, unfollow},
    },
};
use axum::{extract::State, response::Redirect};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use yatube_common::model::user::UserHandle;
use yatube_db::Store;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(profile)
        .typed_post(profile_follow)
        .typed_post(profile_unfollow)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{handle}/", rejection(ServerError))]
pub(super) struct ProfilePath {
    pub(super) handle: UserHandle,
}

async fn profile(
    ProfilePath { handle }: ProfilePath,
    State(store): State<Arc<dyn Store>>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Result<Json<Profile>> {
    let profile = get_profile(&*store, &viewer, &handle, query.selector()).await?;

    Ok(Json(profile))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{handle}/follow/", rejection(ServerError))]
struct FollowPath {
    handle: UserHandle,
}

async fn profile_follow(
    path: Result<FollowPath>,
    LoggedIn(viewer): LoggedIn,
    State(store): State<Arc<dyn Store>>,
) -> Result<Redirect> {
    let FollowPath { handle } = path?;
    follow(&*store, &viewer, &handle).await?;

    Ok(Redirect::to(&ProfilePath { handle }.to_string()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profile/{handle}/unfollow/", rejection(ServerError))]
struct UnfollowPath {
    handle: UserHandle,
}

async fn profile_unfollow(
    path: Result<UnfollowPath>,
    LoggedIn(viewer): LoggedIn,
    State(store): State<Arc<dyn Store>>,
) -> Result<Redirect> {
    let UnfollowPath { handle } = path?;
    unfollow(&*store, &viewer, &handle).await?;

    Ok(Redirect::to(&ProfilePath { handle }.to_string()))
}
