use crate::service::{Result, ServiceError, ValidationError, Viewer, find_post};
use tracing::debug;
use yatube_common::model::{
    Id,
    comment::{Comment, CreateComment},
    post::PostMarker,
    text::BodyText,
};
use yatube_db::{DbError, Store};

/// Stores a comment by the viewer under the post. The text is stored trimmed.
pub async fn add_comment(
    store: &dyn Store,
    viewer: &Viewer,
    post_id: Id<PostMarker>,
    text: &str,
) -> Result<Comment> {
    let user = viewer.require()?;
    let post = find_post(store, post_id).await?;
    let text = BodyText::new(text).map_err(|_| ValidationError::BlankText("comment text"))?;

    let comment = store
        .create_comment(&CreateComment {
            post: post.id,
            author: user.id,
            text,
        })
        .await
        .map_err(|err| match err {
            // The post was deleted after it was looked up.
            DbError::MissingReference(_) => ServiceError::PostNotFound(post_id),
            err => err.into(),
        })?;

    debug!(comment_id = %comment.id, %post_id, author = %user.id, "Added comment");
    Ok(comment)
}

#[cfg(test)]
mod tests {
    use crate::service::{
        ServiceError, ValidationError, Viewer,
        comment::add_comment,
        testing::{self, post, user},
    };
    use yatube_common::model::Id;
    use yatube_db::Store;

    #[tokio::test]
    async fn comment_is_attributed_to_viewer() {
        let store = testing::store();
        let author = user(&store, "author").await;
        let commenter = user(&store, "commenter").await;
        let post = post(&store, &author, None, "post").await;
        let viewer = Viewer::Authenticated(commenter.clone());

        let comment = add_comment(&store, &viewer, post.id, "  nice post ")
            .await
            .unwrap();
        assert_eq!(comment.author, commenter);
        assert_eq!(comment.post, post.id);
        assert_eq!(comment.text.get(), "nice post");

        let comments = store.fetch_post_comments(post.id).await.unwrap();
        assert_eq!(comments, [comment]);
    }

    #[tokio::test]
    async fn blank_comment_is_rejected() {
        let store = testing::store();
        let author = user(&store, "author").await;
        let post = post(&store, &author, None, "post").await;
        let viewer = Viewer::Authenticated(author);

        let result = add_comment(&store, &viewer, post.id, " \n\t ").await;
        assert!(matches!(
            result,
            Err(ServiceError::Validation(ValidationError::BlankText(_)))
        ));
        assert!(store.fetch_post_comments(post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_post() {
        let store = testing::store();
        let author = user(&store, "author").await;
        let viewer = Viewer::Authenticated(author);

        let result = add_comment(&store, &viewer, Id::new(404), "hello").await;
        assert!(matches!(result, Err(ServiceError::PostNotFound(id)) if id == Id::new(404)));
    }

    #[tokio::test]
    async fn anonymous_comment_is_rejected() {
        let store = testing::store();
        let author = user(&store, "author").await;
        let post = post(&store, &author, None, "post").await;

        let result = add_comment(&store, &Viewer::Anonymous, post.id, "hello").await;
        assert!(matches!(result, Err(ServiceError::Unauthorized)));
        assert!(store.fetch_post_comments(post.id).await.unwrap().is_empty());
    }
}
