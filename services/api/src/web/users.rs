//! services/api/src/web/users.rs
//!
//! User listings for admins and trainers.

use axum::{
    extract::State,
    Extension, Json,
};
use lehrjournal_core::domain::Role;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::web::auth::ProfileResponse;
use crate::web::extract::{ApiPath, ApiQuery};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;

#[derive(Deserialize, IntoParams)]
pub struct UserQuery {
    /// Restrict the list to `admin`, `trainer` or `apprentice`.
    pub role: Option<String>,
}

/// List users, optionally by role (admin only).
#[utoipa::path(
    get,
    path = "/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Users ordered by name", body = [ProfileResponse]),
        (status = 400, description = "Unknown role", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "directory"
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    user.require_admin()?;
    let role = query
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(ApiError::invalid)?;
    let users = state.store.list_profiles(role).await?;
    Ok(Json(users.into_iter().map(ProfileResponse::from).collect()))
}

/// List the apprentices assigned to a trainer (that trainer or an admin).
#[utoipa::path(
    get,
    path = "/trainers/{id}/apprentices",
    params(("id" = Uuid, Path, description = "Trainer id")),
    responses(
        (status = 200, description = "Apprentices ordered by name", body = [ProfileResponse]),
        (status = 403, description = "Neither that trainer nor an admin", body = ErrorBody)
    ),
    tag = "directory"
)]
pub async fn trainer_apprentices_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(trainer_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    if !(user.is_admin() || user.uid == trainer_id) {
        return Err(ApiError::denied("Only the trainer or an admin may list these apprentices."));
    }
    let apprentices = state.store.list_apprentices_of(trainer_id).await?;
    Ok(Json(apprentices.into_iter().map(ProfileResponse::from).collect()))
}
