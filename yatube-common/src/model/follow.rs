use crate::model::{Id, user::UserMarker};
use serde::Serialize;
use thiserror::Error;

/// Directed edge: `user` receives the posts of `author` in their following feed.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
pub struct Follow {
    user: Id<UserMarker>,
    author: Id<UserMarker>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("User {0} cannot follow themselves")]
pub struct SelfFollowError(Id<UserMarker>);

impl Follow {
    pub fn new(user: Id<UserMarker>, author: Id<UserMarker>) -> Result<Self, SelfFollowError> {
        if user == author {
            Err(SelfFollowError(user))
        } else {
            Ok(Self { user, author })
        }
    }

    #[must_use]
    pub fn user(self) -> Id<UserMarker> {
        self.user
    }

    #[must_use]
    pub fn author(self) -> Id<UserMarker> {
        self.author
    }
}
