use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::{AppJson, AppQuery, parse_object_id};
use crate::{
    AppState,
    auth::AuthUser,
    errors::AppError,
    models::{InsertResponse, MessageResponse, Review, ReviewRequest},
    repository::RepositoryError,
};

const DUPLICATE_REVIEW: &str = "You have already submitted a review for this scholarship.";

/// ReviewFilter
///
/// Query parameters of GET /reviews.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ReviewFilter {
    /// Author email. Defaults to the caller.
    pub email: Option<String>,
}

/// add_review
///
/// [Authenticated Route] One review per (author, scholarship). The author is
/// always the caller. The lookup gives the friendly message; the unique index
/// catches concurrent inserts.
#[utoipa::path(
    post,
    path = "/add-review",
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review stored", body = InsertResponse),
        (status = 400, description = "Duplicate or invalid review", body = crate::errors::ErrorBody)
    )
)]
pub async fn add_review(
    AuthUser { email }: AuthUser,
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<ReviewRequest>,
) -> Result<(StatusCode, Json<InsertResponse>), AppError> {
    payload.user_email = email;
    payload.validate().map_err(AppError::BadRequest)?;

    if state
        .repo
        .find_review(&payload.user_email, &payload.scholarship_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(DUPLICATE_REVIEW.to_string()));
    }

    match state.repo.insert_review(payload.into_review()).await {
        Ok(id) => Ok((StatusCode::CREATED, Json(InsertResponse::new(id)))),
        Err(RepositoryError::Duplicate) => Err(AppError::BadRequest(DUPLICATE_REVIEW.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// reviews_for_scholarship
///
/// [Public Route]
#[utoipa::path(
    get,
    path = "/reviews/{scholarship_id}",
    params(("scholarship_id" = String, Path, description = "Scholarship ObjectId (hex)")),
    responses((status = 200, description = "Reviews", body = [Review]))
)]
pub async fn reviews_for_scholarship(
    State(state): State<AppState>,
    Path(scholarship_id): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(
        state.repo.reviews_for_scholarship(&scholarship_id).await?,
    ))
}

/// reviews_by_user
///
/// [Authenticated Route] Reviews written by `?email=`, or by the caller.
#[utoipa::path(
    get,
    path = "/reviews",
    params(ReviewFilter),
    responses((status = 200, description = "Reviews", body = [Review]))
)]
pub async fn reviews_by_user(
    AuthUser { email: caller }: AuthUser,
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ReviewFilter>,
) -> Result<Json<Vec<Review>>, AppError> {
    let email = filter.email.unwrap_or(caller);
    Ok(Json(state.repo.reviews_by_user(&email).await?))
}

/// all_reviews
///
/// [Moderator Route]
#[utoipa::path(
    get,
    path = "/all-reviews",
    responses(
        (status = 200, description = "Reviews", body = [Review]),
        (status = 403, description = "Not a moderator or admin", body = crate::errors::ErrorBody)
    )
)]
pub async fn all_reviews(State(state): State<AppState>) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.repo.all_reviews().await?))
}

/// delete_review
///
/// [Public Route]
#[utoipa::path(
    delete,
    path = "/all-reviews/{id}",
    params(("id" = String, Path, description = "Review ObjectId (hex)")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_object_id(&id)?;
    if state.repo.delete_review(id).await? {
        Ok(Json(MessageResponse::ok("review deleted successfully")))
    } else {
        Err(AppError::not_found("review"))
    }
}
