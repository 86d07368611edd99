use crate::model::{
    Id,
    group::{Group, GroupMarker},
    text::BodyText,
    user::{User, UserMarker},
};
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

/// Characters of the post body used as the post title.
pub const POST_TITLE_LEN: usize = 29;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub group: Option<Group>,
    pub text: BodyText,
    pub image: Option<String>,
    pub created_at: UtcDateTime,
}

impl Post {
    #[must_use]
    pub fn title(&self) -> &str {
        self.text.preview(POST_TITLE_LEN)
    }
}

/// Everything the author controls about a post.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PostContent {
    pub text: BodyText,
    pub group: Option<Id<GroupMarker>>,
    pub image: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CreatePost {
    pub author: Id<UserMarker>,
    pub content: PostContent,
}
