//! services/api/src/web/companies.rs
//!
//! Company directory: everyone signed in may list, admins maintain.

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use lehrjournal_core::domain::{Company, CompanyDraft};
use lehrjournal_core::error::require_field;
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
pub struct CompanyRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
    /// Contact person or phone number.
    #[serde(default)]
    pub contact: String,
}

impl CompanyRequest {
    fn into_draft(self) -> ApiResult<CompanyDraft> {
        require_field(&self.name, "name")?;
        Ok(CompanyDraft {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            contact: self.contact.trim().to_string(),
        })
    }
}

/// List all companies.
#[utoipa::path(
    get,
    path = "/companies",
    responses(
        (status = 200, description = "Companies ordered by name"),
        (status = 401, description = "Not signed in", body = ErrorBody)
    ),
    tag = "directory"
)]
pub async fn list_companies_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Company>>> {
    Ok(Json(state.store.list_companies().await?))
}

/// Create a company (admin only).
#[utoipa::path(
    post,
    path = "/companies",
    request_body = CompanyRequest,
    responses(
        (status = 201, description = "Company created"),
        (status = 400, description = "Missing name", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "directory"
)]
pub async fn create_company_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CompanyRequest>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    user.require_admin()?;
    let company = state.store.create_company(req.into_draft()?).await?;
    info!(company = %company.id, name = %company.name, "Created company");
    Ok((StatusCode::CREATED, Json(company)))
}

/// Update a company (admin only).
#[utoipa::path(
    put,
    path = "/companies/{id}",
    request_body = CompanyRequest,
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company updated"),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "No such company", body = ErrorBody)
    ),
    tag = "directory"
)]
pub async fn update_company_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CompanyRequest>,
) -> ApiResult<Json<Company>> {
    user.require_admin()?;
    let company = state.store.update_company(id, req.into_draft()?).await?;
    info!(company = %id, "Updated company");
    Ok(Json(company))
}

/// Delete a company (admin only).
#[utoipa::path(
    delete,
    path = "/companies/{id}",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "No such company", body = ErrorBody)
    ),
    tag = "directory"
)]
pub async fn delete_company_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    state.store.delete_company(id).await?;
    info!(company = %id, "Deleted company");
    Ok(StatusCode::NO_CONTENT)
}
