use crate::server::ServerRouter;

mod feed;
mod posts;
mod profile;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(feed::routes())
        .merge(profile::routes())
        .merge(posts::routes())
}
