use async_trait::async_trait;
use thiserror::Error;
use yatube_common::{
    model::{
        Id, ModelValidationError,
        auth::{AuthTokenHash, Authentication},
        comment::{Comment, CreateComment},
        follow::Follow,
        group::{CreateGroup, Group, GroupMarker, GroupSlug},
        post::{CreatePost, Post, PostContent, PostMarker},
        user::{CreateUser, User, UserHandle, UserMarker},
    },
    pagination::PageWindow,
};

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error("A {0} with the same unique key already exists")]
    Conflict(&'static str),
    #[error("Value {0} does not fit into a database integer")]
    OutOfRange(u64),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Applying migrations failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Which posts a feed is built from.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum FeedFilter {
    All,
    Group(Id<GroupMarker>),
    Author(Id<UserMarker>),
    /// Posts by every author the given user follows.
    FollowedBy(Id<UserMarker>),
}

/// Persistent records behind the application.
///
/// Every method is a single atomic operation against the backing store. Post listings are
/// ordered newest first, with the higher id winning between posts created at the same
/// instant.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>>;

    async fn fetch_user_by_handle(&self, handle: &UserHandle) -> Result<Option<User>>;

    async fn create_user(&self, user: &CreateUser) -> Result<User>;

    async fn fetch_group_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>>;

    async fn create_group(&self, group: &CreateGroup) -> Result<Group>;

    /// Posts of a deleted group stay, with their group cleared.
    async fn delete_group(&self, group_id: Id<GroupMarker>) -> Result<bool>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    async fn create_post(&self, post: &CreatePost) -> Result<Post>;

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        content: &PostContent,
    ) -> Result<Option<Post>>;

    /// Deletes the post together with its comments.
    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool>;

    /// Counts outside any transaction shared with [`Store::fetch_posts`]. Writes landing between
    /// the two calls can leave a page's totals off by the posts created or deleted meanwhile.
    async fn count_posts(&self, filter: FeedFilter) -> Result<u64>;

    async fn fetch_posts(&self, filter: FeedFilter, window: PageWindow) -> Result<Vec<Post>>;

    /// Comments of a post, oldest first.
    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>>;

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment>;

    /// Inserts the edge unless it already exists. Returns whether a new edge was created.
    async fn insert_follow(&self, follow: Follow) -> Result<bool>;

    /// Returns whether an edge was removed.
    async fn delete_follow(&self, follow: Follow) -> Result<bool>;

    async fn follow_exists(&self, follow: Follow) -> Result<bool>;

    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>>;

    async fn create_authentication(&self, authentication: &Authentication) -> Result<()>;
}
