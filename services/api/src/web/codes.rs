//! services/api/src/web/codes.rs
//!
//! Join-code registry maintenance (admin only).

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use lehrjournal_core::credentials::canonical_join_code;
use lehrjournal_core::domain::JoinCode;
use lehrjournal_core::join::issue_join_code;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiResult, ErrorBody};
use crate::web::extract::{ApiJson, ApiPath};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCodeRequest {
    /// Name the apprentice profile will carry.
    pub name: String,
    pub trainer_id: Uuid,
    pub company_id: Uuid,
}

/// List all join codes.
#[utoipa::path(
    get,
    path = "/codes",
    responses(
        (status = 200, description = "Join codes ordered by name"),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "codes"
)]
pub async fn list_codes_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<JoinCode>>> {
    user.require_admin()?;
    Ok(Json(state.store.list_join_codes().await?))
}

/// Issue a new join code for an apprentice.
#[utoipa::path(
    post,
    path = "/codes",
    request_body = IssueCodeRequest,
    responses(
        (status = 201, description = "Code issued"),
        (status = 400, description = "Unknown trainer or company", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "codes"
)]
pub async fn issue_code_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<IssueCodeRequest>,
) -> ApiResult<(StatusCode, Json<JoinCode>)> {
    user.require_admin()?;
    let code = issue_join_code(state.store.as_ref(), &req.name, req.trainer_id, req.company_id).await?;
    Ok((StatusCode::CREATED, Json(code)))
}

/// Revoke a join code.
#[utoipa::path(
    delete,
    path = "/codes/{code}",
    params(("code" = String, Path, description = "The join code")),
    responses(
        (status = 204, description = "Code revoked"),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "No such code", body = ErrorBody)
    ),
    tag = "codes"
)]
pub async fn revoke_code_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(code): ApiPath<String>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    let code = canonical_join_code(&code);
    state.store.delete_join_code(&code).await?;
    info!(%code, "Revoked join code");
    Ok(StatusCode::NO_CONTENT)
}
