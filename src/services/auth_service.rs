use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::auth::cookies::{self, LAST_LOGIN_COOKIE};
use crate::auth::{AuthError, AuthUser, SessionCookies, TokenIssuer};

/// Longest username accepted at login.
pub const MAX_USERNAME_LEN: usize = 64;

/// Cookies to set and the fact of whether the user counted as returning.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub username: String,
    pub returning: bool,
    pub set_cookies: Vec<String>,
}

// Resolve the session cookie into an authenticated user
pub fn authenticate(
    headers: &HeaderMap,
    cookies: &SessionCookies,
    tokens: &TokenIssuer,
) -> Result<AuthUser, AuthError> {
    let token = cookies.session_token(headers).ok_or(AuthError::Missing)?;
    let claims = tokens.validate(&token)?;
    debug!(username = %claims.username, "Session token validated");
    Ok(AuthUser {
        username: claims.username,
    })
}

// Normalize a submitted username, None when unusable
pub fn normalize_username(raw: &str) -> Option<String> {
    let username = raw.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return None;
    }
    Some(username.to_string())
}

// Issue a token for a login and decide which cookies go back to the browser
pub fn login(
    username: &str,
    headers: &HeaderMap,
    cookies: &SessionCookies,
    tokens: &TokenIssuer,
    now: DateTime<Utc>,
) -> Result<LoginGrant, AuthError> {
    let last_login = cookies::plain_cookie(headers, LAST_LOGIN_COOKIE);
    let returning = cookies::is_returning(last_login.as_deref(), now);

    let token = tokens.issue(username)?;
    let mut set_cookies = vec![cookies.session_cookie(&token)];

    if returning {
        info!(username = %username, "User already logged in today");
    } else {
        set_cookies.push(cookies::last_login_cookie(now));
        info!(username = %username, "User logged in");
    }

    Ok(LoginGrant {
        username: username.to_string(),
        returning,
        set_cookies,
    })
}
