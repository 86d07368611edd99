use crate::service::{Result, Viewer, find_user};
use serde::Serialize;
use tracing::debug;
use yatube_common::model::{
    follow::Follow,
    user::{User, UserHandle},
};
use yatube_db::{DbError, Store};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    /// Following yourself is silently ignored.
    SelfFollow,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfollowOutcome {
    Removed,
    NotFollowing,
}

/// Whether the viewer follows `profile`. Anonymous viewers follow nobody.
pub async fn is_following(store: &dyn Store, viewer: &Viewer, profile: &User) -> Result<bool> {
    let Some(user) = viewer.user() else {
        return Ok(false);
    };
    let Ok(follow) = Follow::new(user.id, profile.id) else {
        return Ok(false);
    };

    Ok(store.follow_exists(follow).await?)
}

pub async fn follow(
    store: &dyn Store,
    viewer: &Viewer,
    handle: &UserHandle,
) -> Result<FollowOutcome> {
    let user = viewer.require()?;
    let author = find_user(store, handle).await?;

    let Ok(follow) = Follow::new(user.id, author.id) else {
        debug!(user = %user.id, "Ignoring self-follow");
        return Ok(FollowOutcome::SelfFollow);
    };

    let outcome = match store.insert_follow(follow).await {
        Ok(true) => FollowOutcome::Created,
        Ok(false) | Err(DbError::Conflict(_)) => FollowOutcome::AlreadyFollowing,
        Err(err) => return Err(err.into()),
    };
    Ok(outcome)
}

pub async fn unfollow(
    store: &dyn Store,
    viewer: &Viewer,
    handle: &UserHandle,
) -> Result<UnfollowOutcome> {
    let user = viewer.require()?;
    let author = find_user(store, handle).await?;

    let Ok(follow) = Follow::new(user.id, author.id) else {
        return Ok(UnfollowOutcome::NotFollowing);
    };

    let outcome = if store.delete_follow(follow).await? {
        UnfollowOutcome::Removed
    } else {
        UnfollowOutcome::NotFollowing
    };
    Ok(outcome)
}
