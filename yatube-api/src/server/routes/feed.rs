use crate::{
    server::{
        Result, ServerError, ServerRouter,
        auth::LoggedIn,
        json::Json,
        query::{PageQuery, Query},
    },
    service::{
        Viewer,
        feed::{Feed, FeedScope, get_feed},
    },
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use yatube_common::model::group::GroupSlug;
use yatube_db::Store;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(index)
        .typed_get(group_posts)
        .typed_get(follow_index)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/", rejection(ServerError))]
struct IndexPath();

async fn index(
    IndexPath(): IndexPath,
    State(store): State<Arc<dyn Store>>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Result<Json<Feed>> {
    let feed = get_feed(&*store, &viewer, &FeedScope::All, query.selector()).await?;

    Ok(Json(feed))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/group/{slug}/", rejection(ServerError))]
struct GroupPath {
    slug: GroupSlug,
}

async fn group_posts(
    GroupPath { slug }: GroupPath,
    State(store): State<Arc<dyn Store>>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Result<Json<Feed>> {
    let feed = get_feed(&*store, &viewer, &FeedScope::ByGroup(slug), query.selector()).await?;

    Ok(Json(feed))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/follow/", rejection(ServerError))]
struct FollowIndexPath();

async fn follow_index(
    FollowIndexPath(): FollowIndexPath,
    LoggedIn(viewer): LoggedIn,
    State(store): State<Arc<dyn Store>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Feed>> {
    let feed = get_feed(&*store, &viewer, &FeedScope::Following, query.selector()).await?;

    Ok(Json(feed))
}
