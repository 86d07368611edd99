use crate::{
    server::{
        Result, ServerError, ServerRouter, auth::LoggedIn, json::Json,
        routes::profile::ProfilePath,
    },
    service::{
        comment::add_comment,
        post::{PostDetail, PostForm, create_post, delete_post, edit_post, post_detail},
    },
};
use axum::{extract::State, response::Redirect};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use yatube_common::model::{Id, post::PostMarker};
use yatube_db::Store;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_post)
        .typed_post(post_comment)
        .typed_post(post_create)
        .typed_post(post_edit)
        .typed_post(post_delete)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<dyn Store>>,
) -> Result<Json<PostDetail>> {
    let detail = post_detail(&*store, id).await?;

    Ok(Json(detail))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comment/", rejection(ServerError))]
struct CommentPath {
    id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct CommentForm {
    text: String,
}

async fn post_comment(
    path: Result<CommentPath>,
    LoggedIn(viewer): LoggedIn,
    State(store): State<Arc<dyn Store>>,
    Json(form): Json<CommentForm>,
) -> Result<Redirect> {
    let CommentPath { id } = path?;
    add_comment(&*store, &viewer, id, &form.text).await?;

    Ok(Redirect::to(&PostPath { id }.to_string()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/create/", rejection(ServerError))]
struct CreatePostPath();

async fn post_create(
    CreatePostPath(): CreatePostPath,
    LoggedIn(viewer): LoggedIn,
    State(store): State<Arc<dyn Store>>,
    Json(form): Json<PostForm>,
) -> Result<Redirect> {
    let post = create_post(&*store, &viewer, form).await?;

    Ok(Redirect::to(
        &ProfilePath {
            handle: post.author.handle,
        }
        .to_string(),
    ))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/edit/", rejection(ServerError))]
struct EditPostPath {
    id: Id<PostMarker>,
}

async fn post_edit(
    path: Result<EditPostPath>,
    LoggedIn(viewer): LoggedIn,
    State(store): State<Arc<dyn Store>>,
    Json(form): Json<PostForm>,
) -> Result<Redirect> {
    let EditPostPath { id } = path?;
    edit_post(&*store, &viewer, id, form).await?;

    Ok(Redirect::to(&PostPath { id }.to_string()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/delete/", rejection(ServerError))]
struct DeletePostPath {
    id: Id<PostMarker>,
}

async fn post_delete(
    path: Result<DeletePostPath>,
    LoggedIn(viewer): LoggedIn,
    State(store): State<Arc<dyn Store>>,
) -> Result<Redirect> {
    let DeletePostPath { id } = path?;
    delete_post(&*store, &viewer, id).await?;
    let author = viewer.require()?;

    Ok(Redirect::to(
        &ProfilePath {
            handle: author.handle.clone(),
        }
        .to_string(),
    ))
}
