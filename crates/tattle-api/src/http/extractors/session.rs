//! Session cookie extractors.
//!
//! The session is a plain `tattle_session=<profile id>` cookie set by the
//! OAuth callback. `Session` rejects unauthenticated requests;
//! `MaybeSession` yields `None` for them (used where anonymous access is
//! configurable).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tattle_types::profile::ProfileId;

use crate::http::error::AppError;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "tattle_session";

/// Authenticated request: extracting this yields the signed-in profile id.
pub struct Session(pub ProfileId);

/// Optional session: `None` when no (or an unparsable) cookie is present.
pub struct MaybeSession(pub Option<ProfileId>);

fn session_from_parts(parts: &Parts) -> Option<ProfileId> {
    let header = parts.headers.get(axum::http::header::COOKIE)?;
    let cookies = header.to_str().ok()?;

    for pair in cookies.split(';') {
        let mut kv = pair.trim().splitn(2, '=');
        if kv.next() == Some(SESSION_COOKIE) {
            return kv.next()?.parse::<ProfileId>().ok();
        }
    }
    None
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_from_parts(parts).map(Session).ok_or_else(|| {
            AppError::Unauthorized("Sign in to use this endpoint.".to_string())
        })
    }
}

impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(session_from_parts(parts)))
    }
}

/// Build a Set-Cookie value establishing the session.
pub fn session_cookie(profile_id: &ProfileId) -> String {
    format!("{SESSION_COOKIE}={profile_id}; Path=/; HttpOnly; SameSite=Lax")
}

/// Build a Set-Cookie value clearing the session.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_session_parsed_from_cookie() {
        let id = ProfileId::new();
        let parts = parts_with_cookie(Some(&format!("other=1; tattle_session={id}")));
        assert_eq!(session_from_parts(&parts), Some(id));
    }

    #[test]
    fn test_missing_cookie_is_none() {
        let parts = parts_with_cookie(None);
        assert_eq!(session_from_parts(&parts), None);
    }

    #[test]
    fn test_garbage_session_is_none() {
        let parts = parts_with_cookie(Some("tattle_session=not-a-uuid"));
        assert_eq!(session_from_parts(&parts), None);
    }

    #[test]
    fn test_cookie_builders() {
        let id = ProfileId::new();
        assert!(session_cookie(&id).contains(&id.to_string()));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
