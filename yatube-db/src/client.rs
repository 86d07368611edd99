use crate::{
    MIGRATOR,
    record::{AuthenticationRecord, FullCommentRecord, FullPostRecord, GroupRecord, UserRecord},
    store::{DbError, FeedFilter, Result, Store},
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, query, query_as, query_scalar};
use time::{PrimitiveDateTime, UtcDateTime};
use tracing::debug;
use yatube_common::{
    model::{
        Id,
        auth::{AuthTokenHash, Authentication},
        comment::{Comment, CreateComment},
        follow::Follow,
        group::{CreateGroup, Group, GroupMarker, GroupSlug},
        post::{CreatePost, Post, PostContent, PostMarker},
        user::{CreateUser, User, UserHandle, UserMarker},
    },
    pagination::PageWindow,
};

const SELECT_FULL_POST: &str = "
    SELECT
        posts.post_id,
        posts.text,
        posts.image,
        posts.created_at,
        users.user_id,
        users.handle,
        groups.group_id,
        groups.title AS group_title,
        groups.slug AS group_slug,
        groups.description AS group_description
    FROM
        posts.posts
        JOIN users.users ON users.user_id = posts.user_id
        LEFT JOIN posts.groups ON groups.group_id = posts.group_id
    ";

fn db_int(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| DbError::OutOfRange(value))
}

fn db_id<Marker>(id: Id<Marker>) -> i64 {
    id.get().cast_signed()
}

fn db_time(time: UtcDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(time.date(), time.time())
}

/// Maps constraint violations onto their domain meaning, passing every other error through.
fn constraint_error(err: sqlx::Error, entity: &'static str) -> DbError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DbError::Conflict(entity),
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            DbError::MissingReference(entity)
        }
        _ => DbError::Sqlx(err),
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: FeedFilter) {
    match filter {
        FeedFilter::All => {}
        FeedFilter::Group(group_id) => {
            builder
                .push(" WHERE posts.group_id = ")
                .push_bind(db_id(group_id));
        }
        FeedFilter::Author(user_id) => {
            builder
                .push(" WHERE posts.user_id = ")
                .push_bind(db_id(user_id));
        }
        FeedFilter::FollowedBy(user_id) => {
            builder
                .push(
                    " WHERE posts.user_id IN \
                    (SELECT follows.author_id FROM users.follows WHERE follows.user_id = ",
                )
                .push_bind(db_id(user_id))
                .push(")");
        }
    }
}

/// [`Store`] backed by PostgreSQL.
#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    async fn fetch_post_with(&self, post_id: i64) -> Result<Option<Post>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_FULL_POST);
        builder.push(" WHERE posts.post_id = ").push_bind(post_id);

        let record = builder
            .build_query_as::<FullPostRecord>()
            .fetch_optional(&self.pool)
            .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }
}

#[async_trait]
impl Store for DbClient {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.handle
            FROM
                users.users
            WHERE
                users.user_id = $1
            ",
        )
        .bind(db_id(user_id))
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn fetch_user_by_handle(&self, handle: &UserHandle) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.handle
            FROM
                users.users
            WHERE
                users.handle = $1
            ",
        )
        .bind(handle.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users.users (handle)
            VALUES ($1)
            RETURNING user_id, handle
            ",
        )
        .bind(user.handle.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| constraint_error(err, "user"))?;

        debug!(user_id = record.user_id, handle = %record.handle, "Created user");
        Ok(User::try_from(record)?)
    }

    async fn fetch_group_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT
                groups.group_id,
                groups.title,
                groups.slug,
                groups.description
            FROM
                posts.groups
            WHERE
                groups.slug = $1
            ",
        )
        .bind(slug.get())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    async fn create_group(&self, group: &CreateGroup) -> Result<Group> {
        let record = query_as::<_, GroupRecord>(
            "
            INSERT INTO posts.groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING group_id, title, slug, description
            ",
        )
        .bind(&group.title)
        .bind(group.slug.get())
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| constraint_error(err, "group"))?;

        debug!(group_id = record.group_id, slug = %record.slug, "Created group");
        Ok(Group::try_from(record)?)
    }

    async fn delete_group(&self, group_id: Id<GroupMarker>) -> Result<bool> {
        let deleted = query("DELETE FROM posts.groups WHERE group_id = $1")
            .bind(db_id(group_id))
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        self.fetch_post_with(db_id(post_id)).await
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let post_id = query_scalar::<_, i64>(
            "
            INSERT INTO posts.posts (user_id, group_id, text, image)
            VALUES ($1, $2, $3, $4)
            RETURNING post_id
            ",
        )
        .bind(db_id(post.author))
        .bind(post.content.group.map(db_id))
        .bind(post.content.text.get())
        .bind(post.content.image.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| constraint_error(err, "post author or group"))?;

        debug!(post_id, author = %post.author, "Created post");

        // The author row is protected by the foreign key, so the post is visible here.
        self.fetch_post_with(post_id)
            .await?
            .ok_or(DbError::MissingReference("post"))
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        content: &PostContent,
    ) -> Result<Option<Post>> {
        let updated = query(
            "
            UPDATE posts.posts
            SET group_id = $2, text = $3, image = $4
            WHERE post_id = $1
            ",
        )
        .bind(db_id(post_id))
        .bind(content.group.map(db_id))
        .bind(content.text.get())
        .bind(content.image.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|err| constraint_error(err, "group"))?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        debug!(%post_id, "Updated post");
        self.fetch_post(post_id).await
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let deleted = query("DELETE FROM posts.posts WHERE post_id = $1")
            .bind(db_id(post_id))
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn count_posts(&self, filter: FeedFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts.posts");
        push_filter(&mut builder, filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count.cast_unsigned())
    }

    async fn fetch_posts(&self, filter: FeedFilter, window: PageWindow) -> Result<Vec<Post>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_FULL_POST);
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY posts.created_at DESC, posts.post_id DESC LIMIT ")
            .push_bind(db_int(window.limit)?)
            .push(" OFFSET ")
            .push_bind(db_int(window.offset)?);

        let records = builder
            .build_query_as::<FullPostRecord>()
            .fetch_all(&self.pool)
            .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records = query_as::<_, FullCommentRecord>(
            "
            SELECT
                comments.comment_id,
                comments.post_id,
                comments.text,
                comments.created_at,
                users.user_id,
                users.handle
            FROM
                posts.comments
                JOIN users.users ON users.user_id = comments.user_id
            WHERE
                comments.post_id = $1
            ORDER BY
                comments.created_at, comments.comment_id
            ",
        )
        .bind(db_id(post_id))
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let record = query_as::<_, FullCommentRecord>(
            "
            WITH inserted AS (
                INSERT INTO posts.comments (post_id, user_id, text)
                VALUES ($1, $2, $3)
                RETURNING comment_id, post_id, user_id, text, created_at
            )
            SELECT
                inserted.comment_id,
                inserted.post_id,
                inserted.text,
                inserted.created_at,
                users.user_id,
                users.handle
            FROM
                inserted
                JOIN users.users ON users.user_id = inserted.user_id
            ",
        )
        .bind(db_id(comment.post))
        .bind(db_id(comment.author))
        .bind(comment.text.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| constraint_error(err, "comment post or author"))?;

        debug!(comment_id = record.comment_id, post_id = record.post_id, "Created comment");
        Ok(Comment::try_from(record)?)
    }

    async fn insert_follow(&self, follow: Follow) -> Result<bool> {
        let created = query(
            "
            INSERT INTO users.follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            ",
        )
        .bind(db_id(follow.user()))
        .bind(db_id(follow.author()))
        .execute(&self.pool)
        .await
        .map_err(|err| constraint_error(err, "follow user"))?
        .rows_affected()
            > 0;

        debug!(user = %follow.user(), author = %follow.author(), created, "Inserted follow");
        Ok(created)
    }

    async fn delete_follow(&self, follow: Follow) -> Result<bool> {
        let deleted = query("DELETE FROM users.follows WHERE user_id = $1 AND author_id = $2")
            .bind(db_id(follow.user()))
            .bind(db_id(follow.author()))
            .execute(&self.pool)
            .await?
            .rows_affected();

        debug!(user = %follow.user(), author = %follow.author(), deleted, "Deleted follow");
        Ok(deleted > 0)
    }

    async fn follow_exists(&self, follow: Follow) -> Result<bool> {
        let exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM users.follows WHERE user_id = $1 AND author_id = $2
            )
            ",
        )
        .bind(db_id(follow.user()))
        .bind(db_id(follow.author()))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                authentications.user_id,
                authentications.token_hash,
                authentications.created_at,
                authentications.expires_after_seconds
            FROM
                users.authentications
            WHERE
                authentications.token_hash = $1
            ",
        )
        .bind(&token_hash.0[..])
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }

    async fn create_authentication(&self, authentication: &Authentication) -> Result<()> {
        query(
            "
            INSERT INTO users.authentications
                (token_hash, user_id, created_at, expires_after_seconds)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&authentication.token_hash.0[..])
        .bind(db_id(authentication.user))
        .bind(db_time(authentication.created_at))
        .bind(
            authentication
                .expires_after
                .map(|expires_after| expires_after.get().whole_seconds()),
        )
        .execute(&self.pool)
        .await
        .map_err(|err| constraint_error(err, "authentication"))?;

        Ok(())
    }
}
