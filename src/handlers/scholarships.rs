use axum::{
    Json,
    extract::{Path, State},
};

use super::{AppJson, parse_object_id};
use crate::{
    AppState,
    aggregation::TOP_SCHOLARSHIPS_LIMIT,
    auth::AuthUser,
    errors::AppError,
    models::{InsertResponse, MessageResponse, RatedScholarship, Scholarship, ScholarshipInput},
    repository::UpdateOutcome,
};

/// Size of the plain GET /scholarships page.
const LISTING_PAGE_SIZE: i64 = 20;

/// top_scholarships
///
/// [Public Route] The six cheapest scholarships (newest first on equal fees),
/// each with its average review rating.
#[utoipa::path(
    get,
    path = "/top-scholarships",
    responses((status = 200, description = "Top scholarships", body = [RatedScholarship]))
)]
pub async fn top_scholarships(
    State(state): State<AppState>,
) -> Result<Json<Vec<RatedScholarship>>, AppError> {
    Ok(Json(
        state.repo.top_scholarships(TOP_SCHOLARSHIPS_LIMIT).await?,
    ))
}

/// all_scholarships
///
/// [Public Route] Every scholarship with its average review rating.
#[utoipa::path(
    get,
    path = "/all-scholarships",
    responses((status = 200, description = "Rated scholarships", body = [RatedScholarship]))
)]
pub async fn all_scholarships(
    State(state): State<AppState>,
) -> Result<Json<Vec<RatedScholarship>>, AppError> {
    Ok(Json(state.repo.rated_scholarships().await?))
}

/// create_scholarship
///
/// [Moderator Route] `postedUserEmail` defaults to the caller.
#[utoipa::path(
    post,
    path = "/scholarships",
    request_body = ScholarshipInput,
    responses(
        (status = 200, description = "Created", body = InsertResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorBody),
        (status = 403, description = "Not a moderator or admin", body = crate::errors::ErrorBody)
    )
)]
pub async fn create_scholarship(
    AuthUser { email }: AuthUser,
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<ScholarshipInput>,
) -> Result<Json<InsertResponse>, AppError> {
    payload.validate().map_err(AppError::BadRequest)?;
    if payload.posted_user_email.is_none() {
        payload.posted_user_email = Some(email);
    }
    let id = state
        .repo
        .create_scholarship(payload.into_scholarship())
        .await?;
    tracing::info!(scholarship_id = %id, "scholarship created");
    Ok(Json(InsertResponse::new(id)))
}

/// list_scholarships
///
/// [Public Route] The first page of raw scholarship documents.
#[utoipa::path(
    get,
    path = "/scholarships",
    responses((status = 200, description = "Scholarships", body = [Scholarship]))
)]
pub async fn list_scholarships(
    State(state): State<AppState>,
) -> Result<Json<Vec<Scholarship>>, AppError> {
    Ok(Json(state.repo.list_scholarships(LISTING_PAGE_SIZE).await?))
}

/// get_scholarship
///
/// [Public Route]
#[utoipa::path(
    get,
    path = "/scholarships/{id}",
    params(("id" = String, Path, description = "Scholarship ObjectId (hex)")),
    responses(
        (status = 200, description = "Found", body = Scholarship),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn get_scholarship(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Scholarship>, AppError> {
    let id = parse_object_id(&id)?;
    state
        .repo
        .get_scholarship(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("scholarship"))
}

/// edit_scholarship
///
/// [Moderator Route] Full-field replacement. Re-submitting identical values
/// is not an error.
#[utoipa::path(
    put,
    path = "/edit-manage-scholarship/{id}",
    params(("id" = String, Path, description = "Scholarship ObjectId (hex)")),
    request_body = ScholarshipInput,
    responses(
        (status = 200, description = "Updated or unchanged", body = MessageResponse),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn edit_scholarship(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ScholarshipInput>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_object_id(&id)?;
    payload.validate().map_err(AppError::BadRequest)?;
    match state.repo.update_scholarship(id, payload).await? {
        UpdateOutcome::NotFound => Err(AppError::not_found("scholarship")),
        UpdateOutcome::Unchanged => Ok(Json(MessageResponse::ok("No changes were made"))),
        _ => Ok(Json(MessageResponse::ok(
            "scholarship updated successfully",
        ))),
    }
}

/// delete_scholarship
///
/// [Moderator Route] Reviews and applications referencing the scholarship
/// are left in place.
#[utoipa::path(
    delete,
    path = "/scholarship/{id}",
    params(("id" = String, Path, description = "Scholarship ObjectId (hex)")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn delete_scholarship(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_object_id(&id)?;
    if state.repo.delete_scholarship(id).await? {
        tracing::info!(scholarship_id = %id, "scholarship deleted");
        Ok(Json(MessageResponse::ok("scholarship deleted successfully")))
    } else {
        Err(AppError::not_found("scholarship"))
    }
}
