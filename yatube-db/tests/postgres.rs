//! Checks the PostgreSQL store against the same rules the memory store follows.
//!
//! These need a server: `DATABASE_URL=postgres://... cargo test -p yatube-db -- --ignored`

use sqlx::PgPool;
use yatube_common::{
    model::{
        comment::CreateComment,
        follow::Follow,
        group::{CreateGroup, Group, GroupSlug},
        post::{CreatePost, Post, PostContent},
        text::BodyText,
        user::{CreateUser, User, UserHandle},
    },
    pagination::PageWindow,
};
use yatube_db::{DbClient, FeedFilter, Store};

const FIRST_PAGE: PageWindow = PageWindow {
    number: 1,
    offset: 0,
    limit: 10,
};

async fn user(store: &DbClient, handle: &str) -> User {
    store
        .create_user(&CreateUser {
            handle: UserHandle::new(handle.to_owned()).unwrap(),
        })
        .await
        .unwrap()
}

async fn group(store: &DbClient, slug: &str) -> Group {
    store
        .create_group(&CreateGroup {
            title: format!("Group {slug}"),
            slug: GroupSlug::new(slug.to_owned()).unwrap(),
            description: String::new(),
        })
        .await
        .unwrap()
}

async fn post(store: &DbClient, author: &User, group: Option<&Group>, text: &str) -> Post {
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

fn texts(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|post| post.text.get()).collect()
}

#[sqlx::test(migrator = "yatube_db::MIGRATOR")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn same_instant_posts_order_by_id(pool: PgPool) {
    let store = DbClient::new(pool.clone());
    let author = user(&store, "author").await;
    for text in ["first", "second", "third"] {
        post(&store, &author, None, text).await;
    }
    sqlx::query("UPDATE posts.posts SET created_at = TIMESTAMP '2025-09-17 19:56:00'")
        .execute(&pool)
        .await
        .unwrap();

    let posts = store.fetch_posts(FeedFilter::All, FIRST_PAGE).await.unwrap();
    assert_eq!(texts(&posts), ["third", "second", "first"]);
}

#[sqlx::test(migrator = "yatube_db::MIGRATOR")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn followed_by_lists_followed_authors_only(pool: PgPool) {
    let store = DbClient::new(pool);
    let reader = user(&store, "reader").await;
    let followed = user(&store, "followed").await;
    let stranger = user(&store, "stranger").await;
    post(&store, &followed, None, "followed post").await;
    post(&store, &stranger, None, "stranger post").await;
    post(&store, &reader, None, "own post").await;

    let feed = FeedFilter::FollowedBy(reader.id);
    assert_eq!(store.count_posts(feed).await.unwrap(), 0);

    let edge = Follow::new(reader.id, followed.id).unwrap();
    assert!(store.insert_follow(edge).await.unwrap());

    assert_eq!(store.count_posts(feed).await.unwrap(), 1);
    let posts = store.fetch_posts(feed, FIRST_PAGE).await.unwrap();
    assert_eq!(texts(&posts), ["followed post"]);
}

#[sqlx::test(migrator = "yatube_db::MIGRATOR")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn repeated_follow_keeps_one_edge(pool: PgPool) {
    let store = DbClient::new(pool.clone());
    let reader = user(&store, "reader").await;
    let author = user(&store, "author").await;
    let edge = Follow::new(reader.id, author.id).unwrap();

    assert!(store.insert_follow(edge).await.unwrap());
    assert!(!store.insert_follow(edge).await.unwrap());
    assert!(store.follow_exists(edge).await.unwrap());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users.follows")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    assert!(store.delete_follow(edge).await.unwrap());
    assert!(!store.delete_follow(edge).await.unwrap());
    assert!(!store.follow_exists(edge).await.unwrap());
}

#[sqlx::test(migrator = "yatube_db::MIGRATOR")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn deletes_cascade_and_clear_groups(pool: PgPool) {
    let store = DbClient::new(pool);
    let author = user(&store, "author").await;
    let cats = group(&store, "cats").await;
    let grouped = post(&store, &author, Some(&cats), "meow").await;
    let commented = post(&store, &author, None, "talk").await;
    store
        .create_comment(&CreateComment {
            post: commented.id,
            author: author.id,
            text: BodyText::new("reply").unwrap(),
        })
        .await
        .unwrap();

    assert!(store.delete_group(cats.id).await.unwrap());
    let grouped = store.fetch_post(grouped.id).await.unwrap().unwrap();
    assert_eq!(grouped.group, None);

    assert_eq!(store.fetch_post_comments(commented.id).await.unwrap().len(), 1);
    assert!(store.delete_post(commented.id).await.unwrap());
    assert!(store.fetch_post(commented.id).await.unwrap().is_none());
    assert!(store.fetch_post_comments(commented.id).await.unwrap().is_empty());
}
