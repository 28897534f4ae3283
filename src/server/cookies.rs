use std::time::Duration as StdDuration;

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Create the session cookie carrying the session id.
///
/// Without a TTL the cookie lives for the browser session.
pub(super) fn session_cookie(
    name: &str,
    session_id: &str,
    ttl: Option<StdDuration>,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::build((name.to_string(), session_id.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .build();

    if let Some(max_age) = ttl.and_then(|ttl| Duration::try_from(ttl).ok()) {
        cookie.set_max_age(max_age);
    }

    cookie
}

/// Get the session id from cookies.
pub(super) fn get_session_id(
    jar: &axum_extra::extract::PrivateCookieJar,
    name: &str,
) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
