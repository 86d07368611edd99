//! Sends anonymous viewers of login-only routes to the login page.

use axum::{
    extract::Request,
    http::uri::PathAndQuery,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

pub const LOGIN_PATH: &str = "/auth/login/";

/// Everything but path separators and unreserved characters is encoded.
const NEXT_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Response marker set by handlers that failed because nobody is logged in.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub(crate) struct LoginRequired;

/// Login page URL that returns to `next` afterwards.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", utf8_percent_encode(next, NEXT_VALUE))
}

pub async fn redirect_to_login(request: Request, next: Next) -> Response {
    let target = request
        .uri()
        .path_and_query()
        .map_or("/", PathAndQuery::as_str)
        .to_owned();

    let response = next.run(request).await;
    if response.extensions().get::<LoginRequired>().is_none() {
        return response;
    }

    debug!(%target, "Redirecting anonymous viewer to login");
    Redirect::to(&login_url(&target)).into_response()
}
