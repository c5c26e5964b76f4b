use anyhow::Context;
use axum::http::{header, HeaderMap, HeaderValue};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_TTL_SECS: u64 = 60 * 60 * 24;

/// Set-Cookie headers that open a session for `user_id`.
pub fn issue_headers(user_id: Uuid) -> anyhow::Result<HeaderMap> {
    let cookie = format!(
        "{SESSION_COOKIE}={user_id}; Max-Age={SESSION_TTL_SECS}; Path=/; HttpOnly; Secure; SameSite=Lax"
    );
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).context("session cookie is not a valid header value")?,
    );
    Ok(headers)
}

/// Set-Cookie headers that expire the session immediately.
pub fn clear_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static(
            "session=; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=Lax",
        ),
    );
    headers
}

/// Pull the session user id out of the request's Cookie headers. Tolerates
/// several cookies per line and several Cookie lines per request.
pub fn user_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then_some(value)
        })
        .find_map(|value| Uuid::parse_str(value.trim()).ok())
}
