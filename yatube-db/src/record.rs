use sqlx::FromRow;
use time::{Duration, PrimitiveDateTime};
use yatube_common::model::{
    ModelValidationError,
    auth::Authentication,
    comment::Comment,
    group::{Group, GroupSlug},
    post::Post,
    text::BodyText,
    user::{User, UserHandle},
};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub handle: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct GroupRecord {
    pub group_id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post joined with its author and, if any, its group.
#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FullPostRecord {
    pub post_id: i64,
    pub text: String,
    pub image: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub user_id: i64,
    pub handle: String,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub group_description: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FullCommentRecord {
    pub comment_id: i64,
    pub post_id: i64,
    pub text: String,
    pub created_at: PrimitiveDateTime,
    pub user_id: i64,
    pub handle: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_id: i64,
    pub token_hash: Vec<u8>,
    pub created_at: PrimitiveDateTime,
    pub expires_after_seconds: Option<i64>,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.cast_unsigned().into(),
            handle: UserHandle::new(value.handle)?,
        })
    }
}

impl TryFrom<GroupRecord> for Group {
    type Error = ModelValidationError;

    fn try_from(value: GroupRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.group_id.cast_unsigned().into(),
            title: value.title,
            slug: GroupSlug::new(value.slug)?,
            description: value.description,
        })
    }
}

impl TryFrom<FullPostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: FullPostRecord) -> Result<Self, Self::Error> {
        let group = match (
            value.group_id,
            value.group_title,
            value.group_slug,
            value.group_description,
        ) {
            (Some(group_id), Some(title), Some(slug), Some(description)) => Some(Group::try_from(
                GroupRecord {
                    group_id,
                    title,
                    slug,
                    description,
                },
            )?),
            _ => None,
        };

        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            author: User::try_from(UserRecord {
                user_id: value.user_id,
                handle: value.handle,
            })?,
            group,
            text: BodyText::try_from(value.text)?,
            image: value.image,
            created_at: value.created_at.as_utc(),
        })
    }
}

impl TryFrom<FullCommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: FullCommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.cast_unsigned().into(),
            post: value.post_id.cast_unsigned().into(),
            author: User::try_from(UserRecord {
                user_id: value.user_id,
                handle: value.handle,
            })?,
            text: BodyText::try_from(value.text)?,
            created_at: value.created_at.as_utc(),
        })
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.cast_unsigned().into(),
            token_hash: value.token_hash.into_boxed_slice().try_into()?,
            created_at: value.created_at.as_utc(),
            expires_after: value
                .expires_after_seconds
                .map(|seconds| Duration::seconds(seconds).try_into())
                .transpose()?,
        })
    }
}
