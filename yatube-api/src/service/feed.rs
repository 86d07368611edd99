//! Paginated post listings.

use crate::service::{Result, Viewer, find_group, find_user, follow::is_following};
use serde::Serialize;
use yatube_common::{
    model::{
        group::{Group, GroupSlug},
        post::Post,
        user::{User, UserHandle},
    },
    pagination::{Page, PageSelector, Paginator},
};
use yatube_db::{FeedFilter, Store};

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum FeedScope {
    All,
    ByGroup(GroupSlug),
    ByAuthor(UserHandle),
    /// Posts of every author the viewer follows.
    Following,
}

/// The scope of a feed after its group, author or viewer has been looked up.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ResolvedScope {
    All,
    Group { group: Group },
    Author { author: User },
    Following { viewer: User },
}

impl ResolvedScope {
    fn filter(&self) -> FeedFilter {
        match self {
            ResolvedScope::All => FeedFilter::All,
            ResolvedScope::Group { group } => FeedFilter::Group(group.id),
            ResolvedScope::Author { author } => FeedFilter::Author(author.id),
            ResolvedScope::Following { viewer } => FeedFilter::FollowedBy(viewer.id),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Feed {
    #[serde(flatten)]
    pub scope: ResolvedScope,
    pub page: Page<Post>,
}

/// A user's own page: their posts plus whether the viewer follows them.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Profile {
    pub author: User,
    pub post_count: u64,
    pub following: bool,
    pub page: Page<Post>,
}

async fn resolve(store: &dyn Store, viewer: &Viewer, scope: &FeedScope) -> Result<ResolvedScope> {
    let resolved = match scope {
        FeedScope::All => ResolvedScope::All,
        FeedScope::ByGroup(slug) => ResolvedScope::Group {
            group: find_group(store, slug).await?,
        },
        FeedScope::ByAuthor(handle) => ResolvedScope::Author {
            author: find_user(store, handle).await?,
        },
        FeedScope::Following => ResolvedScope::Following {
            viewer: viewer.require()?.clone(),
        },
    };

    Ok(resolved)
}

/// Builds one page of the feed for `scope`, newest posts first.
///
/// The post count is taken fresh on every call, so page bounds follow posts being added and
/// removed between requests.
pub async fn get_feed(
    store: &dyn Store,
    viewer: &Viewer,
    scope: &FeedScope,
    selector: PageSelector,
) -> Result<Feed> {
    let scope = resolve(store, viewer, scope).await?;
    let page = fetch_page(store, scope.filter(), selector).await?;

    Ok(Feed { scope, page })
}

pub async fn get_profile(
    store: &dyn Store,
    viewer: &Viewer,
    handle: &UserHandle,
    selector: PageSelector,
) -> Result<Profile> {
    let author = find_user(store, handle).await?;
    let following = is_following(store, viewer, &author).await?;
    let page = fetch_page(store, FeedFilter::Author(author.id), selector).await?;

    Ok(Profile {
        author,
        post_count: page.total_items,
        following,
        page,
    })
}

/// Totals come from a separate count, so under concurrent writes they may be briefly stale.
async fn fetch_page(
    store: &dyn Store,
    filter: FeedFilter,
    selector: PageSelector,
) -> Result<Page<Post>> {
    let paginator = Paginator::new(store.count_posts(filter).await?);
    let window = paginator.window(selector);
    let posts = store.fetch_posts(filter, window).await?;

    Ok(Page::new(posts, paginator, window))
}
