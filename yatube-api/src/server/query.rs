use crate::server::ServerError;
use axum::extract::{FromRequestParts, Query as AxumQuery};
use serde::Deserialize;
use yatube_common::pagination::PageSelector;

#[derive(FromRequestParts, Debug, Clone, Copy, Default)]
#[from_request(via(AxumQuery), rejection(ServerError))]
pub struct Query<T>(pub T);

/// The `?page=` parameter shared by every listing.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    page: Option<String>,
}

impl PageQuery {
    pub fn selector(&self) -> PageSelector {
        PageSelector::parse(self.page.as_deref())
    }
}
