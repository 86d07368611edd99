//! Request-independent application logic.
//!
//! Every operation takes the store and the [`Viewer`] explicitly and resolves everything it
//! needs against the current store contents.

pub mod comment;
pub mod feed;
pub mod follow;
pub mod post;

use thiserror::Error;
use yatube_common::model::{
    Id,
    group::{Group, GroupSlug},
    post::{Post, PostMarker},
    user::{User, UserHandle, UserMarker},
};
use yatube_db::{DbError, Store};

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

/// Who is making the request.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum Viewer {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl Viewer {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated(user) => Some(user),
        }
    }

    pub fn require(&self) -> Result<&User> {
        self.user().ok_or(ServiceError::Unauthorized)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ValidationError {
    #[error("The {0} must not be empty.")]
    BlankText(&'static str),
    #[error("There is no group with slug {0}.")]
    UnknownGroup(GroupSlug),
    #[error("The selected group no longer exists.")]
    GroupRemoved,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Group with slug {0} was not found.")]
    GroupNotFound(GroupSlug),
    #[error("User with handle {0} was not found.")]
    UserNotFound(UserHandle),
    #[error("Post with id {0} was not found.")]
    PostNotFound(Id<PostMarker>),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Authentication is required.")]
    Unauthorized,
    #[error("User {user} is not the author of post {post}.")]
    NotAuthor {
        user: Id<UserMarker>,
        post: Id<PostMarker>,
    },
    #[error(transparent)]
    Store(#[from] DbError),
}

impl ServiceError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::GroupNotFound(_)
                | ServiceError::UserNotFound(_)
                | ServiceError::PostNotFound(_)
        )
    }
}

pub(crate) async fn find_user(store: &dyn Store, handle: &UserHandle) -> Result<User> {
    store
        .fetch_user_by_handle(handle)
        .await?
        .ok_or_else(|| ServiceError::UserNotFound(handle.clone()))
}

pub(crate) async fn find_group(store: &dyn Store, slug: &GroupSlug) -> Result<Group> {
    store
        .fetch_group_by_slug(slug)
        .await?
        .ok_or_else(|| ServiceError::GroupNotFound(slug.clone()))
}

pub(crate) async fn find_post(store: &dyn Store, post_id: Id<PostMarker>) -> Result<Post> {
    store
        .fetch_post(post_id)
        .await?
        .ok_or(ServiceError::PostNotFound(post_id))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    };
    use time::{Duration, UtcDateTime, macros::utc_datetime};
    use yatube_common::model::{
        group::{CreateGroup, Group, GroupSlug},
        post::{CreatePost, Post, PostContent},
        text::BodyText,
        user::{CreateUser, User, UserHandle},
    };
    use yatube_db::{MemoryStore, Store};

    /// Memory store whose clock advances one second per stamped row.
    pub fn store() -> MemoryStore {
        let seconds = Arc::new(AtomicI64::new(0));
        MemoryStore::with_clock(move || {
            let start: UtcDateTime = utc_datetime!(2025-09-17 19:56);
            start + Duration::seconds(seconds.fetch_add(1, Ordering::SeqCst))
        })
    }

    pub fn handle(handle: &str) -> UserHandle {
        UserHandle::new(handle.to_owned()).unwrap()
    }

    pub fn slug(slug: &str) -> GroupSlug {
        GroupSlug::new(slug.to_owned()).unwrap()
    }

    pub async fn user(store: &dyn Store, name: &str) -> User {
        store
            .create_user(&CreateUser {
                handle: handle(name),
            })
            .await
            .unwrap()
    }

    pub async fn group(store: &dyn Store, name: &str) -> Group {
        store
            .create_group(&CreateGroup {
                title: format!("Group {name}"),
                slug: slug(name),
                description: String::new(),
            })
            .await
            .unwrap()
    }

    pub async fn post(store: &dyn Store, author: &User, group: Option<&Group>, text: &str) -> Post {
        store
            .create_post(&CreatePost {
                author: author.id,
                content: PostContent {
                    text: BodyText::new(text).unwrap(),
                    group: group.map(|group| group.id),
                    image: None,
                },
            })
            .await
            .unwrap()
    }
}
