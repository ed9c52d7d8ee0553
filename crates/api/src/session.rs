//! Cookie-bound sessions, one-shot alerts and CSRF tokens.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use workflow::{InMemorySessionStore, SessionError, SessionId, SessionStore, SessionStoreExt};

use crate::error::ApiError;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "rent_session";

/// Session key holding the CSRF token.
pub const CSRF_KEY: &str = "csrf_token";

/// Session keys of the one-shot alerts shown on the next rendered page.
pub const FLASH_KEY: &str = "flash";
pub const WARNING_KEY: &str = "warning";
pub const ERROR_KEY: &str = "error";

/// Attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age: Duration,
}

impl CookieSettings {
    /// Builds the `Set-Cookie` value for a session.
    pub fn header_value(&self, session: SessionId) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={session}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.max_age.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Reads a cookie value from the request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Middleware state: the session store and the cookie it issues.
#[derive(Debug, Clone)]
pub struct SessionBinding {
    pub sessions: InMemorySessionStore,
    pub cookie: CookieSettings,
}

impl SessionBinding {
    /// Keeps the client's id only when the store issued it and it is still live.
    async fn resolve(&self, claimed: Option<SessionId>) -> SessionId {
        let Some(claimed) = claimed else {
            return SessionId::new();
        };
        match self.sessions.exists(claimed).await {
            Ok(true) => claimed,
            Ok(false) => {
                tracing::debug!(session = %claimed, "unknown session id replaced");
                SessionId::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed, starting a new session");
                SessionId::new()
            }
        }
    }
}

/// Binds every request to a session.
///
/// A missing, unknown or expired id starts a new session. The cookie is only
/// sent once the session holds something, and then on every response so its
/// lifetime slides with the server side.
pub async fn bind_session(
    State(binding): State<SessionBinding>,
    mut request: Request,
    next: Next,
) -> Response {
    let claimed = cookie_value(request.headers(), SESSION_COOKIE).and_then(SessionId::parse);
    let session = binding.resolve(claimed).await;
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    match binding.sessions.exists(session).await {
        Ok(true) => {}
        Ok(false) => return response,
        Err(e) => {
            tracing::warn!(error = %e, %session, "session lookup failed after request");
            return response;
        }
    }
    match HeaderValue::from_str(&binding.cookie.header_value(session)) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "session cookie is not a valid header"),
    }
    response
}

/// One-shot alerts popped from the session.
#[derive(Debug, Default)]
pub struct Alerts {
    pub flash: Option<String>,
    pub warning: Option<String>,
    pub error: Option<String>,
}

pub async fn take_alerts(
    sessions: &InMemorySessionStore,
    session: SessionId,
) -> Result<Alerts, SessionError> {
    Ok(Alerts {
        flash: sessions.pop_string(session, FLASH_KEY).await?,
        warning: sessions.pop_string(session, WARNING_KEY).await?,
        error: sessions.pop_string(session, ERROR_KEY).await?,
    })
}

/// Stores an error alert for the next rendered page.
pub async fn put_error(
    sessions: &InMemorySessionStore,
    session: SessionId,
    message: &str,
) -> Result<(), SessionError> {
    sessions.put_as(session, ERROR_KEY, &message).await
}

fn new_csrf_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Returns the session's CSRF token, creating it on first use.
pub async fn csrf_token(
    sessions: &InMemorySessionStore,
    session: SessionId,
) -> Result<String, SessionError> {
    if let Some(token) = sessions.get_as::<String>(session, CSRF_KEY).await? {
        return Ok(token);
    }
    let token = new_csrf_token();
    sessions.put_as(session, CSRF_KEY, &token).await?;
    Ok(token)
}

/// Rejects a form post whose token does not match the session's.
pub async fn verify_csrf(
    sessions: &InMemorySessionStore,
    session: SessionId,
    submitted: &str,
) -> Result<(), ApiError> {
    let expected = sessions.get_as::<String>(session, CSRF_KEY).await?;
    match expected {
        Some(expected)
            if !submitted.is_empty()
                && constant_time_eq::constant_time_eq(expected.as_bytes(), submitted.as_bytes()) =>
        {
            Ok(())
        }
        _ => {
            tracing::warn!(%session, "form post rejected: CSRF token mismatch");
            Err(ApiError::BadRequest("Invalid CSRF token".to_string()))
        }
    }
}
