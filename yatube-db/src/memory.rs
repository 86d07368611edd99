//! In-process [`Store`] used by tests and for running without a database.
//!
//! All tables live behind a single lock, so every operation observes and produces a
//! consistent snapshot, like a transaction would.

use crate::store::{DbError, FeedFilter, Result, Store};
use async_trait::async_trait;
use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::{Debug, Formatter},
};
use time::UtcDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use yatube_common::{
    model::{
        Id,
        auth::{AuthTokenHash, Authentication},
        comment::{Comment, CommentMarker, CreateComment},
        follow::Follow,
        group::{CreateGroup, Group, GroupMarker, GroupSlug},
        post::{CreatePost, Post, PostContent, PostMarker},
        text::BodyText,
        user::{CreateUser, User, UserHandle, UserMarker},
    },
    pagination::PageWindow,
};

type Clock = Box<dyn Fn() -> UtcDateTime + Send + Sync>;

#[derive(Clone, Debug)]
struct PostRow {
    author: Id<UserMarker>,
    group: Option<Id<GroupMarker>>,
    text: BodyText,
    image: Option<String>,
    created_at: UtcDateTime,
}

#[derive(Clone, Debug)]
struct CommentRow {
    post: Id<PostMarker>,
    author: Id<UserMarker>,
    text: BodyText,
    created_at: UtcDateTime,
}

#[derive(Default)]
struct Tables {
    last_id: u64,
    users: BTreeMap<Id<UserMarker>, User>,
    groups: BTreeMap<Id<GroupMarker>, Group>,
    posts: BTreeMap<Id<PostMarker>, PostRow>,
    comments: BTreeMap<Id<CommentMarker>, CommentRow>,
    follows: BTreeSet<Follow>,
    authentications: HashMap<AuthTokenHash, Authentication>,
}

impl Tables {
    fn next_id<Marker>(&mut self) -> Id<Marker> {
        self.last_id += 1;
        Id::new(self.last_id)
    }

    fn user(&self, user_id: Id<UserMarker>) -> Result<&User> {
        self.users
            .get(&user_id)
            .ok_or(DbError::MissingReference("user"))
    }

    fn check_group(&self, group_id: Option<Id<GroupMarker>>) -> Result<()> {
        match group_id {
            Some(group_id) if !self.groups.contains_key(&group_id) => {
                Err(DbError::MissingReference("group"))
            }
            _ => Ok(()),
        }
    }

    fn full_post(&self, post_id: Id<PostMarker>, row: &PostRow) -> Result<Post> {
        Ok(Post {
            id: post_id,
            author: self.user(row.author)?.clone(),
            group: row
                .group
                .and_then(|group_id| self.groups.get(&group_id))
                .cloned(),
            text: row.text.clone(),
            image: row.image.clone(),
            created_at: row.created_at,
        })
    }

    fn full_comment(&self, comment_id: Id<CommentMarker>, row: &CommentRow) -> Result<Comment> {
        Ok(Comment {
            id: comment_id,
            post: row.post,
            author: self.user(row.author)?.clone(),
            text: row.text.clone(),
            created_at: row.created_at,
        })
    }

    fn matches(&self, filter: FeedFilter, row: &PostRow) -> bool {
        match filter {
            FeedFilter::All => true,
            FeedFilter::Group(group_id) => row.group == Some(group_id),
            FeedFilter::Author(user_id) => row.author == user_id,
            FeedFilter::FollowedBy(user_id) => Follow::new(user_id, row.author)
                .is_ok_and(|follow| self.follows.contains(&follow)),
        }
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    clock: Clock,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(UtcDateTime::now)
    }

    /// Store stamping new posts and comments with the time returned by `clock`.
    #[must_use]
    pub fn with_clock(clock: impl Fn() -> UtcDateTime + Send + Sync + 'static) -> Self {
        Self {
            tables: RwLock::default(),
            clock: Box::new(clock),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MemoryStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn fetch_user_by_handle(&self, handle: &UserHandle) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        let user = tables.users.values().find(|user| &user.handle == handle);
        Ok(user.cloned())
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|other| other.handle == user.handle) {
            return Err(DbError::Conflict("user"));
        }

        let user = User {
            id: tables.next_id(),
            handle: user.handle.clone(),
        };
        tables.users.insert(user.id, user.clone());

        debug!(user_id = %user.id, handle = user.handle.get(), "Created user");
        Ok(user)
    }

    async fn fetch_group_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        let group = tables.groups.values().find(|group| &group.slug == slug);
        Ok(group.cloned())
    }

    async fn create_group(&self, group: &CreateGroup) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|other| other.slug == group.slug) {
            return Err(DbError::Conflict("group"));
        }

        let group = Group {
            id: tables.next_id(),
            title: group.title.clone(),
            slug: group.slug.clone(),
            description: group.description.clone(),
        };
        tables.groups.insert(group.id, group.clone());

        debug!(group_id = %group.id, slug = group.slug.get(), "Created group");
        Ok(group)
    }

    async fn delete_group(&self, group_id: Id<GroupMarker>) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&group_id).is_none() {
            return Ok(false);
        }

        for post in tables.posts.values_mut() {
            if post.group == Some(group_id) {
                post.group = None;
            }
        }
        Ok(true)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .get(&post_id)
            .map(|row| tables.full_post(post_id, row))
            .transpose()
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        tables.user(post.author)?;
        tables.check_group(post.content.group)?;

        let post_id = tables.next_id();
        let row = PostRow {
            author: post.author,
            group: post.content.group,
            text: post.content.text.clone(),
            image: post.content.image.clone(),
            created_at: (self.clock)(),
        };
        let post = tables.full_post(post_id, &row)?;
        tables.posts.insert(post_id, row);

        debug!(%post_id, author = %post.author.id, "Created post");
        Ok(post)
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        content: &PostContent,
    ) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        tables.check_group(content.group)?;

        let Some(row) = tables.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        row.group = content.group;
        row.text = content.text.clone();
        row.image.clone_from(&content.image);
        let row = row.clone();

        debug!(%post_id, "Updated post");
        tables.full_post(post_id, &row).map(Some)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&post_id).is_none() {
            return Ok(false);
        }

        tables.comments.retain(|_, comment| comment.post != post_id);
        Ok(true)
    }

    async fn count_posts(&self, filter: FeedFilter) -> Result<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .posts
            .values()
            .filter(|row| tables.matches(filter, row))
            .count();

        Ok(count as u64)
    }

    async fn fetch_posts(&self, filter: FeedFilter, window: PageWindow) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;

        let mut rows: Vec<_> = tables
            .posts
            .iter()
            .filter(|(_, row)| tables.matches(filter, row))
            .collect();
        rows.sort_by_key(|(post_id, row)| Reverse((row.created_at, **post_id)));

        let offset =
            usize::try_from(window.offset).map_err(|_| DbError::OutOfRange(window.offset))?;
        let limit =
            usize::try_from(window.limit).map_err(|_| DbError::OutOfRange(window.limit))?;

        rows.into_iter()
            .skip(offset)
            .take(limit)
            .map(|(post_id, row)| tables.full_post(*post_id, row))
            .collect()
    }

    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;

        let mut comments = tables
            .comments
            .iter()
            .filter(|(_, row)| row.post == post_id)
            .map(|(comment_id, row)| tables.full_comment(*comment_id, row))
            .collect::<Result<Vec<_>>>()?;
        comments.sort_by_key(|comment| (comment.created_at, comment.id));

        Ok(comments)
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post) {
            return Err(DbError::MissingReference("post"));
        }
        tables.user(comment.author)?;

        let comment_id = tables.next_id();
        let row = CommentRow {
            post: comment.post,
            author: comment.author,
            text: comment.text.clone(),
            created_at: (self.clock)(),
        };
        let comment = tables.full_comment(comment_id, &row)?;
        tables.comments.insert(comment_id, row);

        debug!(%comment_id, post_id = %comment.post, "Created comment");
        Ok(comment)
    }

    async fn insert_follow(&self, follow: Follow) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.user(follow.user())?;
        tables.user(follow.author())?;

        let created = tables.follows.insert(follow);
        debug!(user = %follow.user(), author = %follow.author(), created, "Inserted follow");
        Ok(created)
    }

    async fn delete_follow(&self, follow: Follow) -> Result<bool> {
        let deleted = self.tables.write().await.follows.remove(&follow);
        debug!(user = %follow.user(), author = %follow.author(), deleted, "Deleted follow");
        Ok(deleted)
    }

    async fn follow_exists(&self, follow: Follow) -> Result<bool> {
        Ok(self.tables.read().await.follows.contains(&follow))
    }

    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let tables = self.tables.read().await;
        Ok(tables.authentications.get(token_hash).cloned())
    }

    async fn create_authentication(&self, authentication: &Authentication) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.user(authentication.user)?;
        if tables
            .authentications
            .contains_key(&authentication.token_hash)
        {
            return Err(DbError::Conflict("authentication"));
        }

        tables
            .authentications
            .insert(authentication.token_hash.clone(), authentication.clone());
        Ok(())
    }
}
