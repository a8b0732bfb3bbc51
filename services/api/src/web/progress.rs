//! services/api/src/web/progress.rs
//!
//! Progress statistics for one apprentice, as JSON or as a PDF report.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use lehrjournal_core::credentials::fold_to_ascii;
use lehrjournal_core::domain::{Entry, UserProfile};
use lehrjournal_core::entries::visible_apprentice;
use lehrjournal_core::ports::PortError;
use lehrjournal_core::report::{layout_report, report_file_name, ReportHeader};
use lehrjournal_core::stats::{compute, ProgressStatistics, TimeFilter};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::adapters::pdf::render_pdf;
use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::web::extract::{ApiPath, ApiQuery};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;

#[derive(Deserialize, IntoParams)]
pub struct StatisticsQuery {
    /// `all` (default), `week`, `month`, `year` or `custom`.
    pub filter: Option<String>,
    /// Start of a custom range, inclusive.
    pub from: Option<NaiveDate>,
    /// End of a custom range, inclusive.
    pub to: Option<NaiveDate>,
}

impl StatisticsQuery {
    fn time_filter(&self) -> ApiResult<TimeFilter> {
        TimeFilter::from_query(self.filter.as_deref(), self.from, self.to).map_err(ApiError::invalid)
    }
}

/// `Content-Disposition` for a download: an ASCII `filename` for old clients
/// and the exact UTF-8 name as `filename*`.
fn attachment_disposition(file_name: &str) -> ApiResult<HeaderValue> {
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fold_to_ascii(file_name),
        urlencoding::encode(file_name)
    );
    HeaderValue::from_str(&value)
        .map_err(|e| ApiError::Internal(format!("Invalid file name header: {}", e)))
}

/// Loads the apprentice (if the caller may see them) and all their entries.
async fn load(
    state: &AppState,
    viewer: &UserProfile,
    apprentice_id: Uuid,
) -> ApiResult<(UserProfile, Vec<Entry>)> {
    let store = state.store.as_ref();
    let apprentice = visible_apprentice(store, viewer, apprentice_id).await?;
    let entries = store.list_entries(apprentice.uid, None, None).await?;
    Ok((apprentice, entries))
}

/// Progress statistics for an apprentice.
#[utoipa::path(
    get,
    path = "/apprentices/{id}/statistics",
    params(("id" = Uuid, Path, description = "Apprentice id"), StatisticsQuery),
    responses(
        (status = 200, description = "Hours per category and task, competency ratings and completion tiers"),
        (status = 400, description = "Invalid filter", body = ErrorBody),
        (status = 403, description = "No access to that apprentice", body = ErrorBody),
        (status = 404, description = "No such apprentice", body = ErrorBody)
    ),
    tag = "progress"
)]
pub async fn statistics_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<StatisticsQuery>,
) -> ApiResult<Json<ProgressStatistics>> {
    let filter = query.time_filter()?;
    let (_, entries) = load(&state, &user, id).await?;
    Ok(Json(compute(&entries, filter, Utc::now().date_naive())))
}

/// Progress report for an apprentice as a PDF download.
#[utoipa::path(
    get,
    path = "/apprentices/{id}/report",
    params(("id" = Uuid, Path, description = "Apprentice id"), StatisticsQuery),
    responses(
        (status = 200, description = "The report as an application/pdf attachment"),
        (status = 400, description = "Invalid filter", body = ErrorBody),
        (status = 403, description = "No access to that apprentice", body = ErrorBody),
        (status = 404, description = "No such apprentice", body = ErrorBody)
    ),
    tag = "progress"
)]
pub async fn report_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<StatisticsQuery>,
) -> ApiResult<Response> {
    let filter = query.time_filter()?;
    let (apprentice, entries) = load(&state, &user, id).await?;
    let today = Utc::now().date_naive();

    let trainer_name = match apprentice.trainer_id {
        Some(trainer_id) => match state.store.get_profile(trainer_id).await {
            Ok(trainer) => Some(trainer.name),
            Err(PortError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };
    let header = ReportHeader {
        apprentice_name: apprentice.name.clone(),
        company_name: apprentice.company_name.clone(),
        trainer_name,
        generated_on: today,
    };

    let stats = compute(&entries, filter, today);
    let layout = layout_report(&header, &stats);
    let bytes = render_pdf(&layout)?;
    info!(apprentice = %id, pages = layout.pages.len(), "Rendered progress report");

    let disposition = attachment_disposition(&report_file_name(&apprentice.name, today))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_carries_ascii_and_utf8_names() {
        let value = attachment_disposition("Zoë_\"Zo\"_Fortschritt_2024-06-03.pdf").unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("attachment; filename=\"Zoe__Zo__Fortschritt_2024-06-03.pdf\";"));
        assert!(value.ends_with("filename*=UTF-8''Zo%C3%AB_%22Zo%22_Fortschritt_2024-06-03.pdf"));
    }
}
