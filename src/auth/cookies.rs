//! Session and "last login" cookies.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};
use cookie::{time, Cookie, CookieJar, Key, SameSite};
use sha2::{Digest, Sha512};

pub const SESSION_COOKIE: &str = "session";
pub const LAST_LOGIN_COOKIE: &str = "last_login";

/// How long a `last_login` marker keeps a user "returning".
pub const RETURNING_WINDOW_HOURS: i64 = 24;

/// Signs the session cookie with a key derived from the server secret.
#[derive(Clone)]
pub struct SessionCookies {
    key: Key,
}

impl std::fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookies").finish_non_exhaustive()
    }
}

impl SessionCookies {
    pub fn new(secret: &str) -> Self {
        let digest = Sha512::digest(secret.as_bytes());
        Self {
            key: Key::from(&digest[..]),
        }
    }

    /// `Set-Cookie` value for a signed session cookie holding `token`.
    pub fn session_cookie(&self, token: &str) -> String {
        let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::hours(RETURNING_WINDOW_HOURS))
            .build();

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        jar.delta()
            .next()
            .map(|c| c.to_string())
            .unwrap_or_default()
    }

    /// The verified token from the session cookie, if present and untampered.
    pub fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        let jar = request_jar(headers);
        jar.signed(&self.key)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    }
}

/// `Set-Cookie` value recording `now` as the last login.
pub fn last_login_cookie(now: DateTime<Utc>) -> String {
    Cookie::build((LAST_LOGIN_COOKIE, now.to_rfc3339()))
        .path("/")
        .max_age(time::Duration::hours(RETURNING_WINDOW_HOURS))
        .build()
        .to_string()
}

/// Raw value of a plain request cookie.
pub fn plain_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    request_jar(headers).get(name).map(|c| c.value().to_string())
}

/// Whether a `last_login` value marks a user seen within the returning window.
pub fn is_returning(last_login: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(raw) = last_login else {
        return false;
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(seen) => {
            let elapsed = now - seen.with_timezone(&Utc);
            elapsed >= Duration::zero() && elapsed < Duration::hours(RETURNING_WINDOW_HOURS)
        }
        Err(_) => false,
    }
}

/// Header value helper for `Set-Cookie`.
pub fn set_cookie_header(value: &str) -> Option<(header::HeaderName, HeaderValue)> {
    HeaderValue::from_str(value)
        .ok()
        .map(|v| (header::SET_COOKIE, v))
}

fn request_jar(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse(raw.to_string()).flatten() {
            jar.add_original(cookie);
        }
    }
    jar
}
