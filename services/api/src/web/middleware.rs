//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use lehrjournal_core::domain::UserProfile;
use lehrjournal_core::ports::PortError;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::state::AppState;

/// The profile of the signed-in caller, inserted by [`require_auth`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserProfile);

impl CurrentUser {
    pub fn require_admin(&self) -> ApiResult<&UserProfile> {
        if !self.0.is_admin() {
            warn!(caller = %self.0.uid, role = %self.0.role, "Rejected admin-only request");
            return Err(ApiError::denied("Only admins may do this."));
        }
        Ok(&self.0)
    }
}

/// Reads the `session` cookie from the request headers.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

/// Resolves the session cookie to an account id, if there is a live session.
pub async fn session_uid(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<Uuid>> {
    let Some(session_id) = session_cookie(headers) else {
        return Ok(None);
    };
    match state.identity.validate_auth_session(session_id).await {
        Ok(uid) => Ok(Some(uid)),
        Err(PortError::Unauthorized) | Err(PortError::NotFound(_)) => {
            debug!("Ignoring unknown or expired session");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Middleware that validates the auth session cookie and loads the caller's profile.
///
/// If valid, inserts a [`CurrentUser`] into request extensions for handlers to use.
/// If invalid or missing, responds with 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let uid = session_uid(&state, req.headers())
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    let profile = state.store.get_profile(uid).await.map_err(|e| match e {
        PortError::NotFound(_) => {
            warn!(%uid, "Signed-in account has no profile");
            ApiError::denied("This account has no profile.")
        }
        other => other.into(),
    })?;

    req.extensions_mut().insert(CurrentUser(profile));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_the_session_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc-123; lang=de"),
        );
        assert_eq!(session_cookie(&headers), Some("abc-123"));
    }

    #[test]
    fn empty_session_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_cookie(&headers), None);
        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }
}
