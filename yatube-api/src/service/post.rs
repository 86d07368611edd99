use crate::service::{Result, ServiceError, ValidationError, Viewer, find_group, find_post};
use serde::{Deserialize, Serialize};
use tracing::debug;
use yatube_common::model::{
    Id,
    comment::Comment,
    group::GroupSlug,
    post::{CreatePost, Post, PostContent, PostMarker},
    text::BodyText,
    user::User,
};
use yatube_db::{DbError, FeedFilter, Store};

/// Post fields as submitted by the author.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PostForm {
    pub text: String,
    #[serde(default)]
    pub group: Option<GroupSlug>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostDetail {
    pub title: String,
    pub post: Post,
    pub author_post_count: u64,
    pub comments: Vec<Comment>,
}

async fn validate(store: &dyn Store, form: PostForm) -> Result<PostContent> {
    let text = BodyText::new(&form.text).map_err(|_| ValidationError::BlankText("post text"))?;

    let group = match form.group {
        Some(slug) => match find_group(store, &slug).await {
            Ok(group) => Some(group.id),
            Err(ServiceError::GroupNotFound(slug)) => {
                return Err(ValidationError::UnknownGroup(slug).into());
            }
            Err(err) => return Err(err),
        },
        None => None,
    };

    Ok(PostContent {
        text,
        group,
        image: form.image.filter(|image| !image.is_empty()),
    })
}

fn check_author(user: &User, post: &Post) -> Result<()> {
    if post.author.id == user.id {
        Ok(())
    } else {
        Err(ServiceError::NotAuthor {
            user: user.id,
            post: post.id,
        })
    }
}

fn group_vanished(err: DbError) -> ServiceError {
    match err {
        DbError::MissingReference(_) => ValidationError::GroupRemoved.into(),
        err => err.into(),
    }
}

pub async fn create_post(store: &dyn Store, viewer: &Viewer, form: PostForm) -> Result<Post> {
    let user = viewer.require()?;
    let content = validate(store, form).await?;

    let post = store
        .create_post(&CreatePost {
            author: user.id,
            content,
        })
        .await
        .map_err(group_vanished)?;

    debug!(post_id = %post.id, author = %user.id, "Created post");
    Ok(post)
}

/// Replaces the content of a post. Only its author may do this.
pub async fn edit_post(
    store: &dyn Store,
    viewer: &Viewer,
    post_id: Id<PostMarker>,
    form: PostForm,
) -> Result<Post> {
    let user = viewer.require()?;
    let post = find_post(store, post_id).await?;
    check_author(user, &post)?;
    let content = validate(store, form).await?;

    let post = store
        .update_post(post_id, &content)
        .await
        .map_err(group_vanished)?
        .ok_or(ServiceError::PostNotFound(post_id))?;

    debug!(%post_id, "Edited post");
    Ok(post)
}

/// Deletes a post and its comments. Only its author may do this.
pub async fn delete_post(
    store: &dyn Store,
    viewer: &Viewer,
    post_id: Id<PostMarker>,
) -> Result<()> {
    let user = viewer.require()?;
    let post = find_post(store, post_id).await?;
    check_author(user, &post)?;

    if !store.delete_post(post_id).await? {
        return Err(ServiceError::PostNotFound(post_id));
    }

    debug!(%post_id, "Deleted post");
    Ok(())
}

pub async fn post_detail(store: &dyn Store, post_id: Id<PostMarker>) -> Result<PostDetail> {
    let post = find_post(store, post_id).await?;
    let author_post_count = store.count_posts(FeedFilter::Author(post.author.id)).await?;
    let comments = store.fetch_post_comments(post_id).await?;

    Ok(PostDetail {
        title: post.title().to_owned(),
        post,
        author_post_count,
        comments,
    })
}

#[cfg(test)]
mod tests {
    use crate::service::{
        ServiceError, ValidationError, Viewer,
        comment::add_comment,
        post::{PostForm, create_post, delete_post, edit_post, post_detail},
        testing::{self, group, post, slug, user},
    };
    use yatube_db::Store;

    fn form(text: &str) -> PostForm {
        PostForm {
            text: text.to_owned(),
            ..PostForm::default()
        }
    }

    #[tokio::test]
    async fn create_post_with_group() {
        let store = testing::store();
        let author = user(&store, "author").await;
        let cats = group(&store, "cats").await;
        let viewer = Viewer::Authenticated(author.clone());

        let post = create_post(
            &store,
            &viewer,
            PostForm {
                group: Some(slug("cats")),
                ..form("A cat post")
            },
        )
        .await
        .unwrap();

        assert_eq!(post.author, author);
        assert_eq!(post.group, Some(cats));
        assert_eq!(post.text.get(), "A cat post");
    }

    #[tokio::test]
    async fn invalid_posts_are_rejected() {
        let store = testing::store();
        let author = user(&store, "author").await;
        let viewer = Viewer::Authenticated(author.clone());

        assert!(matches!(
            create_post(&store, &viewer, form("   ")).await,
            Err(ServiceError::Validation(ValidationError::BlankText(_)))
        ));
        assert!(matches!(
            create_post(
                &store,
                &viewer,
                PostForm {
                    group: Some(slug("missing")),
                    ..form("text")
                }
            )
            .await,
            Err(ServiceError::Validation(ValidationError::UnknownGroup(_)))
        ));
        assert!(matches!(
            create_post(&store, &Viewer::Anonymous, form("text")).await,
            Err(ServiceError::Unauthorized)
        ));

        let count = store
            .count_posts(yatube_db::FeedFilter::All)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn only_author_edits() {
        let store = testing::store();
        let author = user(&store, "author").await;
        let intruder = user(&store, "intruder").await;
        let original = post(&store, &author, None, "original").await;

        let result = edit_post(
            &store,
            &Viewer::Authenticated(intruder),
            original.id,
            form("defaced"),
        )
        .await;
        assert!(matches!(result, Err(ServiceError::NotAuthor { .. })));

        let edited = edit_post(
            &store,
            &Viewer::Authenticated(author),
            original.id,
            form("edited"),
        )
        .await
        .unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.text.get(), "edited");
        assert_eq!(edited.created_at, original.created_at);
    }

    #[tokio::test]
    async fn only_author_deletes() {
        let store = testing::store();
        let author = user(&store, "author").await;
        let intruder = user(&store, "intruder").await;
        let doomed = post(&store, &author, None, "doomed").await;

        assert!(matches!(
            delete_post(&store, &Viewer::Authenticated(intruder), doomed.id).await,
            Err(ServiceError::NotAuthor { .. })
        ));
        delete_post(&store, &Viewer::Authenticated(author), doomed.id)
            .await
            .unwrap();
        assert!(store.fetch_post(doomed.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn detail_lists_comments_oldest_first() {
        let store = testing::store();
        let author = user(&store, "author").await;
        let reader = user(&store, "reader").await;
        let first = post(&store, &author, None, "A post with a rather long text body").await;
        post(&store, &author, None, "Another one").await;

        let reader_viewer = Viewer::Authenticated(reader);
        add_comment(&store, &reader_viewer, first.id, "first!").await.unwrap();
        add_comment(&store, &reader_viewer, first.id, "second").await.unwrap();

        let detail = post_detail(&store, first.id).await.unwrap();
        assert_eq!(detail.title, "A post with a rather long tex");
        assert_eq!(detail.author_post_count, 2);

        let texts: Vec<_> = detail.comments.iter().map(|comment| comment.text.get()).collect();
        assert_eq!(texts, ["first!", "second"]);
    }
}
