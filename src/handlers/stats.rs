use axum::{Json, extract::State};

use crate::{AppState, errors::AppError, models::AdminStats};

/// admin_stats
///
/// [Public Route] Document counts per collection and the number of
/// scholarships in each subject category.
#[utoipa::path(
    get,
    path = "/admin-stats",
    responses((status = 200, description = "Stats", body = AdminStats))
)]
pub async fn admin_stats(State(state): State<AppState>) -> Result<Json<AdminStats>, AppError> {
    Ok(Json(state.repo.admin_stats().await?))
}
