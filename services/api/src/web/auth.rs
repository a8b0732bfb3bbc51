//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: email login, join-code login, logout and the
//! caller's own profile.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use lehrjournal_core::domain::UserProfile;
use lehrjournal_core::join::code_login;
use lehrjournal_core::ports::PortError;
use lehrjournal_core::ServiceError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::web::extract::ApiJson;
use crate::web::middleware::{session_cookie, CurrentUser};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CodeLoginRequest {
    /// The 8-character join code handed out by an admin.
    pub code: String,
}

/// A user profile as the API returns it.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub uid: Uuid,
    /// `admin`, `trainer` or `apprentice`.
    pub role: String,
    pub name: String,
    pub email: String,
    pub company_id: Option<Uuid>,
    pub company_name: Option<String>,
    pub trainer_id: Option<Uuid>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            uid: profile.uid,
            role: profile.role.as_str().to_string(),
            name: profile.name,
            email: profile.email,
            company_id: profile.company_id,
            company_name: profile.company_name,
            trainer_id: profile.trainer_id,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeLoginResponse {
    pub profile: ProfileResponse,
    /// True when this login created the account.
    pub created: bool,
}

//=========================================================================================
// Session Helpers
//=========================================================================================

/// Creates an auth session for `uid` and returns the `Set-Cookie` value.
async fn start_session(state: &AppState, uid: Uuid) -> ApiResult<String> {
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    state
        .identity
        .create_auth_session(&auth_session_id, uid, Utc::now() + ttl)
        .await?;
    Ok(format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        ttl.num_seconds()
    ))
}

const CLEAR_COOKIE: &str = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ProfileResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 403, description = "Account has no profile", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let uid = state
        .identity
        .sign_in(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) | PortError::InvalidCredential => {
                warn!("Failed login attempt");
                ApiError::Service(ServiceError::Unauthenticated(
                    "Invalid email or password".to_string(),
                ))
            }
            other => other.into(),
        })?;

    let profile = state.store.get_profile(uid).await.map_err(|e| match e {
        PortError::NotFound(_) => ApiError::denied("This account has no profile."),
        other => other.into(),
    })?;
    let cookie = start_session(&state, uid).await?;
    info!(%uid, role = %profile.role, "User signed in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ProfileResponse::from(profile)),
    ))
}

/// POST /auth/code-login - Sign in (or register on first use) with a join code
#[utoipa::path(
    post,
    path = "/auth/code-login",
    request_body = CodeLoginRequest,
    responses(
        (status = 200, description = "Signed in to an existing account", body = CodeLoginResponse),
        (status = 201, description = "Account created from the code", body = CodeLoginResponse),
        (status = 400, description = "Malformed code", body = ErrorBody),
        (status = 404, description = "Unknown code", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn code_login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CodeLoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let login = code_login(
        state.identity.as_ref(),
        state.store.as_ref(),
        &state.config.apprentice_email_domain,
        &req.code,
    )
    .await?;
    let cookie = start_session(&state, login.uid).await?;

    let status = if login.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(CodeLoginResponse {
            profile: login.profile.into(),
            created: login.created,
        }),
    ))
}

/// POST /auth/logout - End the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logged out; the session cookie is cleared")
    ),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Some(auth_session_id) = session_cookie(&headers) {
        state.identity.delete_auth_session(auth_session_id).await?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, CLEAR_COOKIE.to_string())],
    ))
}

/// GET /auth/me - The signed-in user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "The caller's profile", body = ProfileResponse),
        (status = 401, description = "Not signed in", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn me_handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ProfileResponse> {
    Json(user.into())
}
