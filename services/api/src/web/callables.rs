//! services/api/src/web/callables.rs
//!
//! The admin callables under `/functions/*`. They are reachable without the
//! auth middleware so that a missing session reports `unauthenticated` in the
//! callable error body; the admin check itself lives in the provisioner.

use axum::{extract::State, http::HeaderMap, Json};
use lehrjournal_core::domain::ProvisionedAccount;
use lehrjournal_core::provisioning::{NewApprentice, NewTrainer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiResult, ErrorBody};
use crate::web::extract::ApiJson;
use crate::web::middleware::session_uid;
use crate::web::state::AppState;

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrainerRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Id of the company the trainer works for.
    pub company: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateApprenticeRequest {
    #[serde(default)]
    pub name: String,
    /// Id of the training company.
    pub company: Option<Uuid>,
    /// Company name used to derive the login email.
    #[serde(default)]
    pub company_name: String,
    pub trainer_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
pub struct DeleteUserRequest {
    pub uid: Option<Uuid>,
}

/// The credentials of a freshly provisioned account. The password is shown once.
#[derive(Serialize, ToSchema)]
pub struct AccountCreatedResponse {
    pub uid: Uuid,
    pub email: String,
    pub password: String,
}

impl From<ProvisionedAccount> for AccountCreatedResponse {
    fn from(account: ProvisionedAccount) -> Self {
        Self {
            uid: account.uid,
            email: account.email,
            password: account.password,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a trainer account (admin only).
#[utoipa::path(
    post,
    path = "/functions/createTrainer",
    request_body = CreateTrainerRequest,
    responses(
        (status = 200, description = "Trainer created", body = AccountCreatedResponse),
        (status = 400, description = "Missing field or unknown company", body = ErrorBody),
        (status = 401, description = "Not signed in", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "functions"
)]
pub async fn create_trainer_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CreateTrainerRequest>,
) -> ApiResult<Json<AccountCreatedResponse>> {
    let caller = session_uid(&state, &headers).await?;
    let account = state
        .provisioner()
        .create_trainer(
            caller,
            NewTrainer {
                email: req.email,
                name: req.name,
                company_id: req.company,
            },
        )
        .await?;
    Ok(Json(account.into()))
}

/// Create an apprentice account with a derived email (admin only).
#[utoipa::path(
    post,
    path = "/functions/createApprentice",
    request_body = CreateApprenticeRequest,
    responses(
        (status = 200, description = "Apprentice created", body = AccountCreatedResponse),
        (status = 400, description = "Missing field, unknown trainer or company", body = ErrorBody),
        (status = 401, description = "Not signed in", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "functions"
)]
pub async fn create_apprentice_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CreateApprenticeRequest>,
) -> ApiResult<Json<AccountCreatedResponse>> {
    let caller = session_uid(&state, &headers).await?;
    let account = state
        .provisioner()
        .create_apprentice(
            caller,
            NewApprentice {
                name: req.name,
                company_id: req.company,
                company_name: req.company_name,
                trainer_id: req.trainer_id,
            },
        )
        .await?;
    Ok(Json(account.into()))
}

/// Delete a user's account and profile (admin only).
#[utoipa::path(
    post,
    path = "/functions/deleteUser",
    request_body = DeleteUserRequest,
    responses(
        (status = 200, description = "User deleted", body = SuccessResponse),
        (status = 400, description = "Missing uid or own account", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody),
        (status = 500, description = "Deletion only partially succeeded", body = ErrorBody)
    ),
    tag = "functions"
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<DeleteUserRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let caller = session_uid(&state, &headers).await?;
    state.provisioner().delete_user(caller, req.uid).await?;
    Ok(Json(SuccessResponse { success: true }))
}
