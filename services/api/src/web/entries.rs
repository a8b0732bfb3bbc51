//! services/api/src/web/entries.rs
//!
//! Work-log entries: listing, submission, trainer notes and deletion.

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use lehrjournal_core::domain::{Entry, EntryDraft};
use lehrjournal_core::entries;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiResult, ErrorBody};
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EntryQuery {
    /// Required for admins; trainers and apprentices default to their own scope.
    pub apprentice_id: Option<Uuid>,
    /// First day, inclusive.
    pub from: Option<NaiveDate>,
    /// Last day, inclusive.
    pub to: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct NoteRequest {
    /// `null` or blank clears the note.
    pub note: Option<String>,
}

/// List the entries visible to the caller, newest first.
#[utoipa::path(
    get,
    path = "/entries",
    params(EntryQuery),
    responses(
        (status = 200, description = "Entries ordered by date, newest first"),
        (status = 403, description = "No access to that apprentice", body = ErrorBody)
    ),
    tag = "entries"
)]
pub async fn list_entries_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<EntryQuery>,
) -> ApiResult<Json<Vec<Entry>>> {
    let list = entries::list_entries(
        state.store.as_ref(),
        &user,
        query.apprentice_id,
        query.from,
        query.to,
    )
    .await?;
    Ok(Json(list))
}

/// Submit the caller's entry for a day; a second submission for the same day updates it.
#[utoipa::path(
    put,
    path = "/entries",
    request_body(content_type = "application/json", description = "The entry draft: date, category, tasks, taskHours, competencies."),
    responses(
        (status = 200, description = "The stored entry"),
        (status = 400, description = "Invalid draft", body = ErrorBody),
        (status = 403, description = "Caller is not an apprentice", body = ErrorBody)
    ),
    tag = "entries"
)]
pub async fn submit_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(draft): ApiJson<EntryDraft>,
) -> ApiResult<Json<Entry>> {
    let entry = entries::submit_entry(state.store.as_ref(), &user, &draft).await?;
    Ok(Json(entry))
}

/// Delete an entry (its author or an admin).
#[utoipa::path(
    delete,
    path = "/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry id")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 403, description = "Not the author", body = ErrorBody),
        (status = 404, description = "No such entry", body = ErrorBody)
    ),
    tag = "entries"
)]
pub async fn delete_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    entries::delete_entry(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set or clear the trainer note; a note marks the entry reviewed.
#[utoipa::path(
    put,
    path = "/entries/{id}/note",
    params(("id" = Uuid, Path, description = "Entry id")),
    request_body = NoteRequest,
    responses(
        (status = 200, description = "The updated entry"),
        (status = 403, description = "Not the entry's trainer", body = ErrorBody),
        (status = 404, description = "No such entry", body = ErrorBody)
    ),
    tag = "entries"
)]
pub async fn set_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<NoteRequest>,
) -> ApiResult<Json<Entry>> {
    let entry = entries::set_trainer_note(state.store.as_ref(), &user, id, req.note).await?;
    Ok(Json(entry))
}
